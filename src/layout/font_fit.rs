use crate::config::Settings;
use crate::text_metrics::{MeasureError, TextMeasurer};

/// Font size for one label.
///
/// An explicit positive size is used as-is. Otherwise, with auto-fit on, the
/// label is measured once at the default size and scaled linearly so it spans
/// `available_width`; the result never drops below the default.
pub async fn fit_font_size<M: TextMeasurer>(
    measurer: &M,
    text: &str,
    available_width: f32,
    explicit: Option<f32>,
    settings: &Settings<'_>,
) -> Result<f32, MeasureError> {
    if let Some(size) = explicit.filter(|s| s.is_finite() && *s > 0.0) {
        return Ok(size);
    }
    let default_size = settings.default_font_size();
    if !settings.call.auto_fit_labels {
        return Ok(default_size);
    }
    let measured = measurer
        .measure_width(text, settings.font_family(), default_size)
        .await?;
    Ok(scale_font_size(default_size, measured, available_width))
}

/// `ceil(max(default * available / measured, default))`.
pub fn scale_font_size(default_size: f32, measured_width: f32, available_width: f32) -> f32 {
    let floor = default_size.ceil();
    if !(measured_width > 0.0) || !measured_width.is_finite() {
        return floor;
    }
    let scaled = (default_size * (available_width / measured_width)).max(default_size).ceil();
    if scaled.is_finite() { scaled } else { floor }
}
