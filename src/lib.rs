#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod node;
#[cfg(feature = "raster")]
pub mod raster;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use compositor::Compositor;
pub use config::{AnnotateConfig, Config, Settings, StrokeWidthMode, load_config};
pub use error::{AnnotateError, ErrorKind};
pub use ir::AnnotationInput;
pub use layout::{Canvas, Geometry, Overlay, ResolvedLabel, ResolvedShape, compute_overlay};
pub use node::{AnnotateNode, Failure, Message, Property};
#[cfg(feature = "raster")]
pub use raster::ImageCompositor;
pub use render::render_svg;
pub use text_metrics::{FontMeasurer, HeuristicMeasurer, TextMeasurer};
pub use theme::Theme;

/// Burns `annotations` into `image` and returns the re-encoded bytes.
///
/// The canvas size is probed once; every shape and label is resolved against
/// it and composited in a single pass. Any collaborator failure aborts the
/// whole batch.
pub async fn annotate<C: Compositor, M: TextMeasurer>(
    image: &[u8],
    annotations: &[AnnotationInput],
    settings: &Settings<'_>,
    compositor: &C,
    measurer: &M,
) -> error::Result<Vec<u8>> {
    if annotations.is_empty() {
        return Err(AnnotateError::NoAnnotations);
    }
    let canvas = compositor
        .probe(image)
        .await
        .map_err(AnnotateError::processing)?;
    let overlay = compute_overlay(canvas, annotations, settings, measurer)
        .await
        .map_err(AnnotateError::processing)?;
    let svg = render_svg(&overlay);
    tracing::debug!(shapes = overlay.shapes.len(), bytes = svg.len(), "compositing overlay");
    compositor
        .composite(image, &svg)
        .await
        .map_err(AnnotateError::processing)
}
