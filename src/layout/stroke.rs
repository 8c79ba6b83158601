use super::Geometry;
use crate::config::{Settings, StrokeWidthMode};

/// Stroke width for one shape. An explicit positive width wins; otherwise the
/// width follows the configured mode. Never returns less than 1.
pub fn resolve_stroke_width(explicit: Option<f32>, geometry: &Geometry, settings: &Settings<'_>) -> f32 {
    if let Some(width) = explicit.filter(|w| w.is_finite() && *w > 0.0) {
        return width;
    }
    match settings.call.stroke_width_mode {
        StrokeWidthMode::Fixed => at_least_one(settings.line_width()),
        StrokeWidthMode::Proportional => derive_stroke_width(
            geometry.size_metric(),
            settings.theme.reference_height,
            settings.theme.reference_stroke_width,
        ),
    }
}

/// `round(size / reference_height * reference_width)`, floored at 1.
pub fn derive_stroke_width(size: f32, reference_height: f32, reference_width: f32) -> f32 {
    at_least_one((size / reference_height * reference_width).round())
}

fn at_least_one(width: f32) -> f32 {
    if width.is_finite() { width.max(1.0) } else { 1.0 }
}
