use crate::layout::{Geometry, Overlay};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub shapes: Vec<ShapeDump>,
}

#[derive(Debug, Serialize)]
pub struct ShapeDump {
    pub index: usize,
    pub kind: String,
    /// `[x, y, w, h]` for rects, `[cx, cy, r]` for circles.
    pub geometry: Vec<f32>,
    pub stroke: String,
    pub fill: String,
    pub stroke_width: f32,
    pub label: Option<LabelDump>,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub text: String,
    pub font_size: f32,
    pub color: String,
    pub x: f32,
    pub y: f32,
}

impl LayoutDump {
    pub fn from_overlay(overlay: &Overlay) -> Self {
        let shapes = overlay
            .shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| ShapeDump {
                index,
                kind: shape.geometry.kind_name().to_string(),
                geometry: match shape.geometry {
                    Geometry::Rect { x, y, w, h } => vec![x, y, w, h],
                    Geometry::Circle { x, y, r } => vec![x, y, r],
                },
                stroke: shape.stroke.clone(),
                fill: shape.fill.clone(),
                stroke_width: shape.stroke_width,
                label: shape.label.as_ref().map(|label| LabelDump {
                    text: label.text.clone(),
                    font_size: label.font_size,
                    color: label.color.clone(),
                    x: label.anchor_x,
                    y: label.anchor_y,
                }),
            })
            .collect();

        LayoutDump {
            width: overlay.canvas.width,
            height: overlay.canvas.height,
            font_family: overlay.font_family.clone(),
            shapes,
        }
    }
}

pub fn write_layout_dump(path: &Path, overlay: &Overlay) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_overlay(overlay);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
