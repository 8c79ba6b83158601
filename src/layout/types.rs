use serde::Serialize;

/// Pixel size of the base image. Origin is top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { x: f32, y: f32, r: f32 },
}

impl Geometry {
    /// Height of a rect, diameter of a circle.
    pub fn size_metric(&self) -> f32 {
        match *self {
            Geometry::Rect { h, .. } => h,
            Geometry::Circle { r, .. } => 2.0 * r,
        }
    }

    /// Width a label may grow to.
    pub fn available_width(&self) -> f32 {
        match *self {
            Geometry::Rect { w, .. } => w,
            Geometry::Circle { r, .. } => 2.0 * r,
        }
    }

    /// Top and bottom edge.
    pub fn vertical_extent(&self) -> (f32, f32) {
        match *self {
            Geometry::Rect { y, h, .. } => (y, y + h),
            Geometry::Circle { y, r, .. } => (y - r, y + r),
        }
    }

    pub fn left(&self) -> f32 {
        match *self {
            Geometry::Rect { x, .. } => x,
            Geometry::Circle { x, r, .. } => x - r,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Rect { .. } => "rect",
            Geometry::Circle { .. } => "circle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabel {
    pub text: String,
    pub font_size: f32,
    pub color: String,
    pub anchor_x: f32,
    /// Text baseline.
    pub anchor_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedShape {
    pub geometry: Geometry,
    pub stroke: String,
    pub fill: String,
    pub stroke_width: f32,
    pub label: Option<ResolvedLabel>,
}

/// Everything the SVG serializer needs, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub canvas: Canvas,
    pub font_family: String,
    pub shapes: Vec<ResolvedShape>,
}
