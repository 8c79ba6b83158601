use serde::{Deserialize, Serialize};

/// Builtin defaults, the last tier of every per-shape lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub stroke: String,
    pub fill: String,
    pub line_width: f32,
    pub font_size: f32,
    pub font_color: String,
    pub font_family: String,
    /// Shape height at which the derived stroke equals `reference_stroke_width`.
    pub reference_height: f32,
    pub reference_stroke_width: f32,
}

impl Theme {
    pub fn amber() -> Self {
        Self {
            stroke: "#ffC000".to_string(),
            fill: "none".to_string(),
            line_width: 5.0,
            font_size: 20.0,
            font_color: "#ffC000".to_string(),
            font_family: "DejaVu Sans, Arial, sans-serif".to_string(),
            reference_height: 700.0,
            reference_stroke_width: 14.0,
        }
    }

    /// Defaults of the fixed-width engine that predates size-derived strokes.
    pub fn legacy() -> Self {
        Self {
            font_size: 24.0,
            ..Self::amber()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::amber()
    }
}
