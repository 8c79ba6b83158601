use super::Geometry;

/// Label anchor `(x, baseline)` for a shape.
///
/// The label starts at the shape's left extent. Vertically it sits `gap` above
/// the top edge unless that baseline is off-canvas or nearer the top than the
/// below-candidate is to the bottom; then it goes `gap` below the bottom edge.
pub fn label_anchor(geometry: &Geometry, font_size: f32, canvas_height: f32, gap: f32) -> (f32, f32) {
    let (top, bottom) = geometry.vertical_extent();
    (
        geometry.left(),
        choose_baseline(top, bottom, font_size, canvas_height, gap),
    )
}

fn choose_baseline(top: f32, bottom: f32, font_size: f32, canvas_height: f32, gap: f32) -> f32 {
    let below = bottom + gap + font_size;
    let above = top - gap;
    if above < 0.0 || above < canvas_height - below {
        below
    } else {
        above
    }
}
