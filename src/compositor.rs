use crate::layout::Canvas;
use std::future::Future;

/// Image codec boundary: reads the base image size and burns an SVG overlay
/// of the same size into it.
pub trait Compositor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn probe(&self, image: &[u8]) -> impl Future<Output = Result<Canvas, Self::Error>> + Send;

    /// Returns the re-encoded image with `overlay_svg` drawn at the origin.
    fn composite(
        &self,
        image: &[u8],
        overlay_svg: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}
