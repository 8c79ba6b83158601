use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Shape tag after type inference. Anything unrecognised is kept so it can be
/// skipped explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
    Unknown(String),
}

impl ShapeKind {
    pub fn from_token(token: &str) -> Self {
        match token {
            "rect" => Self::Rect,
            "circle" => Self::Circle,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// One annotation as received, loosely typed.
///
/// `None` means the field was absent (or JSON `null`). A field that is present
/// but not numeric is kept as `NaN` so it renders as a degenerate shape
/// instead of being rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationInput {
    pub kind: Option<String>,
    pub bbox: Option<Vec<f32>>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub w: Option<f32>,
    pub h: Option<f32>,
    pub r: Option<f32>,
    pub label: Option<String>,
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub line_width: Option<f32>,
    pub font_size: Option<f32>,
    pub font_color: Option<String>,
}

impl AnnotationInput {
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            kind: Some("rect".to_string()),
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Default::default()
        }
    }

    pub fn bbox(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            bbox: Some(vec![x, y, w, h]),
            ..Default::default()
        }
    }

    pub fn circle(x: f32, y: f32, r: f32) -> Self {
        Self {
            kind: Some("circle".to_string()),
            x: Some(x),
            y: Some(y),
            r: Some(r),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let bbox = obj.get("bbox").filter(|v| is_truthy(v)).map(|v| match v {
            Value::Array(items) => items.iter().map(lenient_number).collect(),
            _ => Vec::new(),
        });
        let number = |key: &str| obj.get(key).filter(|v| !v.is_null()).map(lenient_number);
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let label = match obj.get("label") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) if n.as_f64().is_some_and(|n| n != 0.0) => Some(n.to_string()),
            _ => None,
        };
        // A truthy non-string type is kept verbatim so it is skipped as unknown.
        let kind = obj.get("type").filter(|v| is_truthy(v)).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Self {
            kind,
            bbox,
            x: number("x"),
            y: number("y"),
            w: number("w"),
            h: number("h"),
            r: number("r"),
            label,
            stroke: text("stroke"),
            fill: text("fill"),
            line_width: number("lineWidth"),
            font_size: number("fontSize"),
            font_color: text("fontColor"),
        }
    }
}

impl<'de> Deserialize<'de> for AnnotationInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Reads an annotation list. `None` unless `value` is a non-empty array.
pub fn parse_annotations(value: Option<&Value>) -> Option<Vec<AnnotationInput>> {
    let items = value?.as_array()?;
    if items.is_empty() {
        return None;
    }
    Some(items.iter().map(AnnotationInput::from_json).collect())
}

fn lenient_number(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().map(|n| n as f32).unwrap_or(f32::NAN),
        Value::String(s) => s.trim().parse::<f32>().unwrap_or(f32::NAN),
        _ => f32::NAN,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
