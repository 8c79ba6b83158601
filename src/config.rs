use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How stroke widths are chosen when an annotation carries no `lineWidth`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeWidthMode {
    /// Scale with the shape size relative to the theme's reference height.
    #[default]
    Proportional,
    /// Always use the configured line width.
    Fixed,
}

/// Label size used when neither the call nor the theme gives a usable one.
pub const FALLBACK_FONT_SIZE: f32 = 20.0;

/// Per-call overrides. `None` falls through to the theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotateConfig {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub line_width: Option<f32>,
    pub font_size: Option<f32>,
    pub font_color: Option<String>,
    pub font_family: Option<String>,
    pub font_file: Option<PathBuf>,
    pub stroke_width_mode: StrokeWidthMode,
    pub auto_fit_labels: bool,
    pub label_gap: f32,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            stroke: None,
            fill: None,
            line_width: None,
            font_size: None,
            font_color: None,
            font_family: None,
            font_file: None,
            stroke_width_mode: StrokeWidthMode::Proportional,
            auto_fit_labels: true,
            label_gap: 5.0,
        }
    }
}

/// A value that can be "not given" without being absent, e.g. `""` or `0`.
pub trait Setting: Copy {
    fn is_set(self) -> bool;
}

impl Setting for &str {
    fn is_set(self) -> bool {
        !self.is_empty()
    }
}

impl Setting for f32 {
    fn is_set(self) -> bool {
        self.is_finite() && self != 0.0
    }
}

/// Picks the first set value: annotation, then call config, then builtin.
pub fn resolve<T: Setting>(annotation: Option<T>, call: Option<T>, builtin: T) -> T {
    annotation
        .filter(|value| value.is_set())
        .or_else(|| call.filter(|value| value.is_set()))
        .unwrap_or(builtin)
}

/// Immutable per-call view of the overrides and the builtin theme.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a> {
    pub call: &'a AnnotateConfig,
    pub theme: &'a Theme,
}

impl<'a> Settings<'a> {
    pub fn new(call: &'a AnnotateConfig, theme: &'a Theme) -> Self {
        Self { call, theme }
    }

    pub fn stroke(&self, annotation: Option<&str>) -> String {
        resolve(annotation, self.call.stroke.as_deref(), self.theme.stroke.as_str()).to_string()
    }

    pub fn fill(&self, annotation: Option<&str>) -> String {
        resolve(annotation, self.call.fill.as_deref(), self.theme.fill.as_str()).to_string()
    }

    pub fn font_color(&self, annotation: Option<&str>) -> String {
        resolve(
            annotation,
            self.call.font_color.as_deref(),
            self.theme.font_color.as_str(),
        )
        .to_string()
    }

    pub fn font_family(&self) -> &'a str {
        resolve(None, self.call.font_family.as_deref(), self.theme.font_family.as_str())
    }

    pub fn line_width(&self) -> f32 {
        resolve(None, self.call.line_width, self.theme.line_width)
    }

    /// Baseline label size: the floor of the auto-fit solver. Always positive.
    pub fn default_font_size(&self) -> f32 {
        let positive = |size: f32| size > 0.0;
        let size = resolve(
            None,
            self.call.font_size.filter(|s| positive(*s)),
            self.theme.font_size,
        );
        if size.is_finite() && positive(size) {
            size
        } else {
            FALLBACK_FONT_SIZE
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A property of the incoming message.
    #[default]
    Msg,
}

/// Where the base image bytes come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSource {
    pub kind: SourceKind,
    pub path: String,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            kind: SourceKind::Msg,
            path: "payload".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    pub source: DataSource,
    pub annotations_property: String,
    pub output_property: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            annotations_property: "annotations".to_string(),
            output_property: "payload".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub annotate: AnnotateConfig,
    pub node: NodeConfig,
}

impl Config {
    pub fn settings(&self) -> Settings<'_> {
        Settings::new(&self.annotate, &self.theme)
    }

    /// Lists `family` ahead of the configured label fonts. Used after a font
    /// file is registered so labels are measured and drawn in the same face.
    pub fn prefer_font_family(&mut self, family: &str) {
        let current = self.settings().font_family().trim();
        let list = if current.is_empty() {
            format!("\"{family}\"")
        } else {
            format!("\"{family}\", {current}")
        };
        self.annotate.font_family = Some(list);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    annotate: Option<AnnotateConfig>,
    node: Option<NodeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    stroke: Option<String>,
    fill: Option<String>,
    line_width: Option<f32>,
    font_size: Option<f32>,
    font_color: Option<String>,
    font_family: Option<String>,
    reference_height: Option<f32>,
    reference_stroke_width: Option<f32>,
}

/// Loads a JSON or JSON5 config file on top of the builtin defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "legacy" {
            config.theme = Theme::legacy();
        } else if theme_name == "amber" || theme_name == "default" {
            config.theme = Theme::amber();
        } else {
            anyhow::bail!("unknown theme '{theme_name}'");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.stroke {
            config.theme.stroke = v;
        }
        if let Some(v) = vars.fill {
            config.theme.fill = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.font_color {
            config.theme.font_color = v;
        }
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.reference_height {
            config.theme.reference_height = v;
        }
        if let Some(v) = vars.reference_stroke_width {
            config.theme.reference_stroke_width = v;
        }
    }

    if let Some(annotate) = parsed.annotate {
        config.annotate = annotate;
    }
    if let Some(node) = parsed.node {
        config.node = node;
    }

    Ok(config)
}
