//! Rendered-width measurement for label text.
//!
//! The layout engine only needs one number per label: how wide the string is
//! at a given font size. [`FontMeasurer`] answers with real glyph advances from
//! installed (or explicitly registered) fonts; [`HeuristicMeasurer`] uses a
//! fixed per-character table and never touches the font database.

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ttf_parser::Face;

#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("font database lock poisoned")]
    Poisoned,
    #[error("failed to load font file {path}: {source}")]
    FontFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font file {0} contains no usable face")]
    NoFace(PathBuf),
}

/// Measures the rendered width of a single-line string in pixels.
pub trait TextMeasurer {
    fn measure_width(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
    ) -> impl Future<Output = Result<f32, MeasureError>> + Send;
}

impl<M: TextMeasurer + Sync> TextMeasurer for &M {
    fn measure_width(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
    ) -> impl Future<Output = Result<f32, MeasureError>> + Send {
        (**self).measure_width(text, font_family, font_size)
    }
}

/// Glyph-advance measurement backed by a process-wide font database.
///
/// Font files added with [`register_font_file`] become visible to every
/// measurer; list their family in the label font family to use them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMeasurer;

impl FontMeasurer {
    pub fn new() -> Self {
        Self
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure_width(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
    ) -> impl Future<Output = Result<f32, MeasureError>> + Send {
        std::future::ready(measure_text_width(text, font_size, font_family))
    }
}

/// Font-free measurement from a calibrated per-character width table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_width(
        &self,
        text: &str,
        _font_family: &str,
        font_size: f32,
    ) -> impl Future<Output = Result<f32, MeasureError>> + Send {
        std::future::ready(Ok(fallback_text_width(text, font_size)))
    }
}

static TEXT_MEASURER: Lazy<Mutex<FaceCache>> = Lazy::new(|| Mutex::new(FaceCache::new()));

/// Width of `text` at `font_size`, falling back to the heuristic table when
/// no installed face matches `font_family`.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Result<f32, MeasureError> {
    if text.is_empty() || !(font_size > 0.0) {
        return Ok(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().map_err(|_| MeasureError::Poisoned)?;
    Ok(guard
        .measure(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size)))
}

/// Loads a font file into the shared database and returns its family name.
pub fn register_font_file(path: &Path) -> Result<String, MeasureError> {
    let mut guard = TEXT_MEASURER.lock().map_err(|_| MeasureError::Poisoned)?;
    guard.register(path)
}

struct FaceCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FaceCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn register(&mut self, path: &Path) -> Result<String, MeasureError> {
        self.db
            .load_font_file(path)
            .map_err(|source| MeasureError::FontFile {
                path: path.to_path_buf(),
                source,
            })?;
        let family = self
            .db
            .faces()
            .filter(|info| matches!(&info.source, Source::File(p) if p == path))
            .find_map(|info| info.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| MeasureError::NoFace(path.to_path_buf()))?;
        // Earlier misses may now resolve to the new face.
        self.faces.retain(|_, face| face.is_some());
        Ok(family)
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key)?.as_mut()?;
        let normalized = text.replace('\t', "    ");
        face.measure_width(&normalized, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(Family<'static>),
            Name(usize),
        }

        let mut names: Vec<String> = Vec::new();
        let mut order: Vec<FamilyToken> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => order.push(FamilyToken::Generic(Family::Serif)),
                "sans-serif" | "system-ui" | "ui-sans-serif" => {
                    order.push(FamilyToken::Generic(Family::SansSerif))
                }
                "monospace" | "ui-monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                "cursive" => order.push(FamilyToken::Generic(Family::Cursive)),
                "fantasy" => order.push(FamilyToken::Generic(Family::Fantasy)),
                _ => {
                    order.push(FamilyToken::Name(names.len()));
                    names.push(raw.to_string());
                }
            }
        }
        if order.is_empty() {
            order.push(FamilyToken::Generic(Family::SansSerif));
        }

        let families: Vec<Family<'_>> = order
            .iter()
            .map(|token| match *token {
                FamilyToken::Generic(family) => family,
                FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
            })
            .collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
            advance_cache: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;

        if text.is_ascii() {
            let mut width = 0.0f32;
            for byte in text.as_bytes() {
                if *byte == b'\n' {
                    continue;
                }
                match self.ascii_advances[*byte as usize] {
                    0 => width += fallback,
                    advance => width += advance as f32 * scale,
                }
            }
            return Some(width.max(0.0));
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = *self.advance_cache.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .map(|glyph| face.glyph_hor_advance(glyph).unwrap_or(0))
            });
            match advance {
                Some(advance) => width += advance as f32 * scale,
                None => width += fallback,
            }
        }
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

/// Em-relative advance in DejaVu Sans, the default label face
/// (`hmtx` advance / 2048 units per em).
fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' | '.' | ',' => 0.318,
        ':' | ';' | '|' | '\\' => 0.337,
        '!' => 0.401,
        '(' | ')' | '[' | ']' => 0.390,
        '{' | '}' => 0.636,
        '-' => 0.361,
        '_' => 0.500,
        'A' | 'V' => 0.684,
        'B' => 0.686,
        'C' => 0.698,
        'D' => 0.770,
        'E' => 0.632,
        'F' => 0.575,
        'G' => 0.776,
        'H' => 0.752,
        'I' | 'J' => 0.295,
        'K' => 0.656,
        'L' => 0.557,
        'M' => 0.863,
        'N' => 0.748,
        'O' | 'Q' => 0.787,
        'P' => 0.603,
        'R' => 0.695,
        'S' => 0.635,
        'T' | 'Y' => 0.611,
        'U' => 0.732,
        'W' => 0.989,
        'X' | 'Z' => 0.685,
        'a' => 0.613,
        'b' | 'd' | 'g' | 'p' | 'q' => 0.635,
        'c' => 0.550,
        'e' => 0.615,
        'f' => 0.352,
        'h' | 'n' | 'u' => 0.634,
        'i' | 'j' | 'l' => 0.278,
        'k' => 0.579,
        'm' => 0.974,
        'o' => 0.612,
        'r' => 0.411,
        's' => 0.521,
        't' => 0.392,
        'v' | 'x' | 'y' => 0.592,
        'w' => 0.818,
        'z' => 0.525,
        '0'..='9' => 0.636,
        '@' => 1.000,
        '#' => 0.838,
        '%' => 0.950,
        '&' => 0.780,
        // CJK and other wide scripts.
        '\u{2e80}'.. => 1.000,
        _ => 0.600,
    }
}
