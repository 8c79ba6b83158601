use crate::compositor::Compositor;
use crate::layout::Canvas;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba};
use resvg::tiny_skia;
use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to read image header: {0}")]
    Header(#[source] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to parse overlay SVG: {0}")]
    SvgParse(#[source] usvg::Error),
    #[error("failed to allocate a {0}x{1} pixmap")]
    PixmapAlloc(u32, u32),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to load font file {path}: {source}")]
    FontFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `image` + `resvg` compositor. Output keeps the input's encoding.
#[derive(Debug, Clone)]
pub struct ImageCompositor {
    font_family: String,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ImageCompositor {
    pub fn new(font_family: &str) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            font_family: font_family.to_string(),
            fontdb: Arc::new(db),
        }
    }

    /// Adds a font file, e.g. a bundled label face, to the render database.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self, RasterError> {
        Arc::make_mut(&mut self.fontdb)
            .load_font_file(path)
            .map_err(|source| RasterError::FontFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(self)
    }

    pub fn probe_sync(&self, image: &[u8]) -> Result<Canvas, RasterError> {
        let (width, height) = ImageReader::new(Cursor::new(image))
            .with_guessed_format()
            .map_err(RasterError::Header)?
            .into_dimensions()
            .map_err(RasterError::Decode)?;
        Ok(Canvas::new(width, height))
    }

    pub fn composite_sync(&self, image: &[u8], overlay_svg: &str) -> Result<Vec<u8>, RasterError> {
        let format = image::guess_format(image).map_err(RasterError::Decode)?;
        let mut base = image::load_from_memory_with_format(image, format)
            .map_err(RasterError::Decode)?
            .to_rgba8();
        let (width, height) = base.dimensions();

        let mut opt = usvg::Options::default();
        opt.font_family = self.font_family.clone();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(overlay_svg, &opt).map_err(RasterError::SvgParse)?;

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(RasterError::PixmapAlloc(width, height))?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(base.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        for (dst, src) in base.pixels_mut().zip(pixmap.pixels()) {
            let color = src.demultiply();
            *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        }

        encode(DynamicImage::ImageRgba8(base), format)
    }
}

impl Compositor for ImageCompositor {
    type Error = RasterError;

    fn probe(&self, image: &[u8]) -> impl Future<Output = Result<Canvas, RasterError>> + Send {
        std::future::ready(self.probe_sync(image))
    }

    fn composite(
        &self,
        image: &[u8],
        overlay_svg: &str,
    ) -> impl Future<Output = Result<Vec<u8>, RasterError>> + Send {
        std::future::ready(self.composite_sync(image, overlay_svg))
    }
}

fn encode(image: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, RasterError> {
    // JPEG has no alpha channel.
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).map_err(RasterError::Encode)?;
    Ok(out.into_inner())
}
