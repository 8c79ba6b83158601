use crate::layout::{Geometry, Overlay, ResolvedLabel, ResolvedShape};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Serializes the overlay to an SVG document the size of the canvas. Each
/// shape is followed directly by its label, in overlay order.
pub fn render_svg(overlay: &Overlay) -> String {
    let mut svg = String::new();
    let width = overlay.canvas.width;
    let height = overlay.canvas.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    for shape in &overlay.shapes {
        svg.push_str(&shape_svg(shape));
        if let Some(label) = &shape.label {
            svg.push_str(&label_svg(label, &overlay.font_family));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn shape_svg(shape: &ResolvedShape) -> String {
    let paint = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&shape.fill),
        escape_xml(&shape.stroke),
        fmt_num(shape.stroke_width)
    );
    match shape.geometry {
        Geometry::Rect { x, y, w, h } => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {paint}/>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(w),
            fmt_num(h)
        ),
        Geometry::Circle { x, y, r } => format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {paint}/>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(r)
        ),
    }
}

fn label_svg(label: &ResolvedLabel, font_family: &str) -> String {
    format!(
        "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        fmt_num(label.anchor_x),
        fmt_num(label.anchor_y),
        escape_xml(font_family),
        fmt_num(label.font_size),
        escape_xml(&label.color),
        escape_xml(&label.text)
    )
}

/// Two decimals at most, without trailing zeros. Non-finite values are
/// written as-is so degenerate shapes stay degenerate.
fn fmt_num(value: f32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

pub fn write_output_bytes(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Canvas;

    fn overlay(shapes: Vec<ResolvedShape>) -> Overlay {
        Overlay {
            canvas: Canvas::new(800, 600),
            font_family: "DejaVu Sans".to_string(),
            shapes,
        }
    }

    fn rect_shape(label: Option<ResolvedLabel>) -> ResolvedShape {
        ResolvedShape {
            geometry: Geometry::Rect {
                x: 0.0,
                y: 50.0,
                w: 90.0,
                h: 80.0,
            },
            stroke: "#ffC000".to_string(),
            fill: "none".to_string(),
            stroke_width: 2.0,
            label,
        }
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&overlay(vec![rect_shape(None)]));
        assert!(svg.starts_with(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"600\" viewBox=\"0 0 800 600\">"
        ));
        assert!(svg.contains(
            "<rect x=\"0\" y=\"50\" width=\"90\" height=\"80\" fill=\"none\" stroke=\"#ffC000\" stroke-width=\"2\"/>"
        ));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn label_follows_its_shape() {
        let label = ResolvedLabel {
            text: "cat & <dog>".to_string(),
            font_size: 27.0,
            color: "#ffC000".to_string(),
            anchor_x: 0.0,
            anchor_y: 162.0,
        };
        let circle = ResolvedShape {
            geometry: Geometry::Circle {
                x: 10.5,
                y: 20.25,
                r: 3.0,
            },
            stroke: "red".to_string(),
            fill: "none".to_string(),
            stroke_width: 1.0,
            label: None,
        };
        let svg = render_svg(&overlay(vec![rect_shape(Some(label)), circle]));
        let rect_at = svg.find("<rect").unwrap();
        let text_at = svg.find("<text").unwrap();
        let circle_at = svg.find("<circle").unwrap();
        assert!(rect_at < text_at && text_at < circle_at);
        assert!(svg.contains(
            "<text x=\"0\" y=\"162\" font-family=\"DejaVu Sans\" font-size=\"27\" fill=\"#ffC000\">cat &amp; &lt;dog&gt;</text>"
        ));
        assert!(svg.contains("<circle cx=\"10.5\" cy=\"20.25\" r=\"3\""));
    }

    #[test]
    fn degenerate_values_pass_through() {
        let mut shape = rect_shape(None);
        shape.geometry = Geometry::Rect {
            x: 0.0,
            y: 0.0,
            w: -10.0,
            h: f32::NAN,
        };
        let svg = render_svg(&overlay(vec![shape]));
        assert!(svg.contains("width=\"-10\" height=\"NaN\""));
    }

    #[test]
    fn fmt_num_trims_zeros() {
        assert_eq!(fmt_num(20.0), "20");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(1.234), "1.23");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(100.0), "100");
    }
}
