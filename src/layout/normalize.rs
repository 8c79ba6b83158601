use super::Geometry;
use crate::ir::{AnnotationInput, ShapeKind};

/// Shape tag, inferring `rect` from a bare `bbox`. `None` when there is
/// neither a type nor a bounding box.
pub fn shape_kind(input: &AnnotationInput) -> Option<ShapeKind> {
    match (input.kind.as_deref(), &input.bbox) {
        (Some(token), _) => Some(ShapeKind::from_token(token)),
        (None, Some(_)) => Some(ShapeKind::Rect),
        (None, None) => None,
    }
}

/// Pulls numeric geometry out of a raw annotation. Unknown shapes yield `None`;
/// missing numbers stay `NaN`.
pub fn normalize(input: &AnnotationInput) -> Option<Geometry> {
    let field = |value: Option<f32>| value.unwrap_or(f32::NAN);
    match shape_kind(input)? {
        ShapeKind::Rect => Some(match &input.bbox {
            Some(bbox) => {
                let at = |idx: usize| bbox.get(idx).copied().unwrap_or(f32::NAN);
                Geometry::Rect {
                    x: at(0),
                    y: at(1),
                    w: at(2),
                    h: at(3),
                }
            }
            None => Geometry::Rect {
                x: field(input.x),
                y: field(input.y),
                w: field(input.w),
                h: field(input.h),
            },
        }),
        ShapeKind::Circle => Some(Geometry::Circle {
            x: field(input.x),
            y: field(input.y),
            r: field(input.r),
        }),
        ShapeKind::Unknown(token) => {
            tracing::warn!(shape = %token, "skipping annotation with unsupported type");
            None
        }
    }
}
