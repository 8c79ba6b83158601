//! Annotation geometry and label layout.
//!
//! Each annotation runs through normalize -> clamp -> stroke width, then its
//! label (if any) is font-fitted and placed. Font fitting awaits the text
//! measurer, so all labels are fitted concurrently and joined back in input
//! order before the overlay is assembled.

pub mod clamp;
pub mod font_fit;
pub mod normalize;
pub mod placement;
pub mod stroke;
mod types;

pub use types::*;

use crate::config::Settings;
use crate::ir::AnnotationInput;
use crate::text_metrics::{MeasureError, TextMeasurer};
use futures::future::try_join_all;

use clamp::clamp_to_canvas;
use font_fit::fit_font_size;
use normalize::normalize;
use placement::label_anchor;
use stroke::resolve_stroke_width;

/// A shape whose geometry and colors are final but whose label is not yet sized.
struct PendingShape<'a> {
    input: &'a AnnotationInput,
    geometry: Geometry,
    stroke: String,
    fill: String,
    stroke_width: f32,
}

/// Resolves every annotation into an overlay sized to `canvas`. Unsupported
/// shapes are skipped; a measurement failure fails the whole batch.
pub async fn compute_overlay<M: TextMeasurer>(
    canvas: Canvas,
    annotations: &[AnnotationInput],
    settings: &Settings<'_>,
    measurer: &M,
) -> Result<Overlay, MeasureError> {
    let pending: Vec<PendingShape<'_>> = annotations
        .iter()
        .filter_map(|input| {
            let geometry = clamp_to_canvas(normalize(input)?);
            Some(PendingShape {
                input,
                geometry,
                stroke: settings.stroke(input.stroke.as_deref()),
                fill: settings.fill(input.fill.as_deref()),
                stroke_width: resolve_stroke_width(input.line_width, &geometry, settings),
            })
        })
        .collect();

    tracing::debug!(
        received = annotations.len(),
        shapes = pending.len(),
        width = canvas.width,
        height = canvas.height,
        "resolving overlay"
    );

    let labels = try_join_all(
        pending
            .iter()
            .map(|shape| resolve_label(shape, canvas, settings, measurer)),
    )
    .await?;

    let shapes = pending
        .into_iter()
        .zip(labels)
        .map(|(shape, label)| ResolvedShape {
            geometry: shape.geometry,
            stroke: shape.stroke,
            fill: shape.fill,
            stroke_width: shape.stroke_width,
            label,
        })
        .collect();

    Ok(Overlay {
        canvas,
        font_family: settings.font_family().to_string(),
        shapes,
    })
}

async fn resolve_label<M: TextMeasurer>(
    shape: &PendingShape<'_>,
    canvas: Canvas,
    settings: &Settings<'_>,
    measurer: &M,
) -> Result<Option<ResolvedLabel>, MeasureError> {
    let Some(text) = shape.input.label.as_deref() else {
        return Ok(None);
    };
    let font_size = fit_font_size(
        measurer,
        text,
        shape.geometry.available_width(),
        shape.input.font_size,
        settings,
    )
    .await?;
    let (anchor_x, anchor_y) = label_anchor(
        &shape.geometry,
        font_size,
        canvas.height as f32,
        settings.call.label_gap,
    );
    Ok(Some(ResolvedLabel {
        text: text.to_string(),
        font_size,
        color: settings.font_color(shape.input.font_color.as_deref()),
        anchor_x,
        anchor_y,
    }))
}
