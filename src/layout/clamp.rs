use super::Geometry;

/// Moves a rect's negative origin to zero, shrinking the paired extent by the
/// same amount. The extent may end up non-positive; such rects are kept.
/// Circles pass through untouched.
pub fn clamp_to_canvas(geometry: Geometry) -> Geometry {
    match geometry {
        Geometry::Rect {
            mut x,
            mut y,
            mut w,
            mut h,
        } => {
            if x < 0.0 {
                w += x;
                x = 0.0;
            }
            if y < 0.0 {
                h += y;
                y = 0.0;
            }
            Geometry::Rect { x, y, w, h }
        }
        circle @ Geometry::Circle { .. } => circle,
    }
}
