use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::executor::block_on;
use image_annotate::text_metrics::MeasureError;
use image_annotate::{
    AnnotateNode, AnnotationInput, Canvas, Compositor, Config, ErrorKind, Message, Property,
    TextMeasurer, annotate, compute_overlay, render_svg,
};
use serde_json::json;

/// Completes after being polled `n` extra times.
struct YieldN(usize);

impl Future for YieldN {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            Poll::Ready(())
        } else {
            self.0 -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Width is linear in font size; longer labels take fewer polls to finish so
/// completion order is the reverse of input order.
#[derive(Default)]
struct LinearMeasurer {
    completed: Mutex<Vec<String>>,
    families: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl TextMeasurer for LinearMeasurer {
    fn measure_width(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
    ) -> impl Future<Output = Result<f32, MeasureError>> + Send {
        let text = text.to_string();
        self.families.lock().unwrap().push(font_family.to_string());
        async move {
            YieldN(20usize.saturating_sub(text.len() * 3)).await;
            if self.fail_on == Some(text.as_str()) {
                return Err(MeasureError::Poisoned);
            }
            self.completed.lock().unwrap().push(text.clone());
            Ok(text.chars().count() as f32 * font_size * 0.5)
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("codec exploded")]
struct CodecError;

struct RecordingCompositor {
    canvas: Canvas,
    fail_probe: bool,
    svgs: Mutex<Vec<String>>,
}

impl RecordingCompositor {
    fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            fail_probe: false,
            svgs: Mutex::new(Vec::new()),
        }
    }

    fn last_svg(&self) -> String {
        self.svgs.lock().unwrap().last().cloned().expect("composite was not called")
    }
}

impl Compositor for RecordingCompositor {
    type Error = CodecError;

    fn probe(&self, _image: &[u8]) -> impl Future<Output = Result<Canvas, CodecError>> + Send {
        std::future::ready(if self.fail_probe {
            Err(CodecError)
        } else {
            Ok(self.canvas)
        })
    }

    fn composite(
        &self,
        image: &[u8],
        overlay_svg: &str,
    ) -> impl Future<Output = Result<Vec<u8>, CodecError>> + Send {
        self.svgs.lock().unwrap().push(overlay_svg.to_string());
        let mut out = image.to_vec();
        out.extend_from_slice(b"+overlay");
        std::future::ready(Ok(out))
    }
}

fn node(compositor: RecordingCompositor) -> AnnotateNode<RecordingCompositor, LinearMeasurer> {
    AnnotateNode::new(Config::default(), compositor, LinearMeasurer::default())
}

fn message(annotations: serde_json::Value) -> Message {
    Message::new()
        .with_bytes("payload", b"IMG".to_vec())
        .with_json("annotations", annotations)
}

#[test]
fn end_to_end_box_with_label() {
    let node = node(RecordingCompositor::new(800, 600));
    let out = block_on(node.on_input(message(json!([{"bbox": [-10, 50, 100, 80], "label": "car"}]))))
        .expect("annotation should succeed");

    assert_eq!(out.get("payload"), Some(&Property::Bytes(b"IMG+overlay".to_vec())));

    // "car" is 30px at 20px, so 90px of width allows 60px text.
    let svg = node.compositor().last_svg();
    assert!(svg.contains("width=\"800\" height=\"600\""));
    assert!(svg.contains(
        "<rect x=\"0\" y=\"50\" width=\"90\" height=\"80\" fill=\"none\" stroke=\"#ffC000\" stroke-width=\"2\"/>"
    ));
    assert!(svg.contains("<text x=\"0\" y=\"195\""), "{svg}");
    assert!(svg.contains("font-size=\"60\""));
    assert!(svg.contains(">car</text>"));
}

#[test]
fn labels_keep_input_order_when_measurement_finishes_out_of_order() {
    let compositor = RecordingCompositor::new(1000, 1000);
    let measurer = LinearMeasurer::default();
    let config = Config::default();
    let annotations = vec![
        AnnotationInput::rect(10.0, 100.0, 50.0, 50.0).with_label("a"),
        AnnotationInput::circle(300.0, 300.0, 40.0).with_label("bbb"),
        AnnotationInput::rect(500.0, 500.0, 80.0, 80.0).with_label("cccccc"),
    ];

    block_on(annotate(b"IMG", &annotations, &config.settings(), &compositor, &measurer)).unwrap();

    let completed = measurer.completed.lock().unwrap().clone();
    assert_eq!(completed, ["cccccc", "bbb", "a"]);

    let svg = compositor.last_svg();
    let a = svg.find(">a</text>").unwrap();
    let circle = svg.find("<circle").unwrap();
    let b = svg.find(">bbb</text>").unwrap();
    let c = svg.find(">cccccc</text>").unwrap();
    assert!(a < circle && circle < b && b < c, "{svg}");
}

#[test]
fn unknown_shapes_are_dropped_silently() {
    let node = node(RecordingCompositor::new(100, 100));
    let msg = message(json!([
        {"type": "triangle", "x": 1, "y": 2},
        {"type": "rect", "x": 1, "y": 2, "w": 3, "h": 4}
    ]));
    block_on(node.on_input(msg)).expect("unknown types are not errors");
    let svg = node.compositor().last_svg();
    assert_eq!(svg.matches("<rect").count(), 1);
    assert!(!svg.contains("triangle"));
}

#[test]
fn empty_annotations_fail_with_no_annotations() {
    let node = node(RecordingCompositor::new(100, 100));
    let failure = block_on(node.on_input(message(json!([])))).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NoAnnotations);
    assert_eq!(failure.text, "No annotations");
    assert!(node.compositor().svgs.lock().unwrap().is_empty());
}

#[test]
fn missing_annotations_fail_with_no_annotations() {
    let node = node(RecordingCompositor::new(100, 100));
    let msg = Message::new().with_bytes("payload", b"IMG".to_vec());
    let failure = block_on(node.on_input(msg)).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NoAnnotations);

    let not_a_list = message(json!({"type": "rect"}));
    let failure = block_on(node.on_input(not_a_list)).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NoAnnotations);
}

#[test]
fn string_source_fails_with_invalid_input() {
    let node = node(RecordingCompositor::new(100, 100));
    let msg = Message::new()
        .with_json("payload", json!("not a buffer"))
        .with_json("annotations", json!([{"type": "rect"}]));
    let failure = block_on(node.on_input(msg)).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::InvalidInput);
    // The original message comes back, with the error attached.
    assert_eq!(failure.message.json("payload"), Some(&json!("not a buffer")));
    assert_eq!(failure.message.json("error").unwrap()["kind"], "invalidInput");
}

#[test]
fn missing_source_fails_with_invalid_source() {
    let node = node(RecordingCompositor::new(100, 100));
    let msg = Message::new().with_json("annotations", json!([{"type": "rect"}]));
    let failure = block_on(node.on_input(msg)).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::InvalidSource);
}

#[test]
fn probe_failure_is_an_image_processing_error() {
    let mut compositor = RecordingCompositor::new(100, 100);
    compositor.fail_probe = true;
    let node = node(compositor);
    let failure = block_on(node.on_input(message(json!([{"bbox": [1, 2, 3, 4]}])))).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::ImageProcessing);
    assert_eq!(failure.text, "Image processing error");
}

#[test]
fn measurement_failure_aborts_the_whole_batch() {
    let compositor = RecordingCompositor::new(500, 500);
    let measurer = LinearMeasurer {
        fail_on: Some("bad"),
        ..Default::default()
    };
    let config = Config::default();
    let annotations = vec![
        AnnotationInput::rect(10.0, 10.0, 50.0, 50.0).with_label("good"),
        AnnotationInput::rect(100.0, 100.0, 50.0, 50.0).with_label("bad"),
    ];
    let err = block_on(annotate(b"IMG", &annotations, &config.settings(), &compositor, &measurer))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageProcessing);
    assert!(compositor.svgs.lock().unwrap().is_empty(), "nothing may be composited");
}

#[test]
fn custom_property_names_are_honoured() {
    let mut config = Config::default();
    config.node.source.path = "frame.image".to_string();
    config.node.annotations_property = "boxes".to_string();
    config.node.output_property = "annotated".to_string();
    let node = AnnotateNode::new(config, RecordingCompositor::new(10, 10), LinearMeasurer::default());

    // Nested paths resolve into JSON, which is never a buffer.
    let msg = Message::new()
        .with_json("frame", json!({"image": "x"}))
        .with_json("boxes", json!([{"bbox": [0, 0, 1, 1]}]));
    assert_eq!(block_on(node.on_input(msg)).unwrap_err().kind, ErrorKind::InvalidInput);

    let mut config = Config::default();
    config.node.source.path = "frame".to_string();
    config.node.annotations_property = "boxes".to_string();
    config.node.output_property = "annotated".to_string();
    let node = AnnotateNode::new(config, RecordingCompositor::new(10, 10), LinearMeasurer::default());
    let msg = Message::new()
        .with_bytes("frame", b"IMG".to_vec())
        .with_json("boxes", json!([{"bbox": [0, 0, 1, 1]}]));
    let out = block_on(node.on_input(msg)).unwrap();
    assert_eq!(out.bytes("annotated"), Some(&b"IMG+overlay"[..]));
    assert_eq!(out.bytes("frame"), Some(&b"IMG"[..]));
}

#[test]
fn registered_family_is_measured_and_drawn() {
    let mut config = Config::default();
    config.prefer_font_family("Bundled Mono");
    let measurer = LinearMeasurer::default();
    let annotations = [AnnotationInput::rect(10.0, 10.0, 40.0, 20.0).with_label("iiii")];

    let overlay = block_on(compute_overlay(
        Canvas::new(200, 200),
        &annotations,
        &config.settings(),
        &measurer,
    ))
    .unwrap();

    let families = measurer.families.lock().unwrap().clone();
    assert_eq!(families, [overlay.font_family.clone()]);
    assert!(overlay.font_family.starts_with("\"Bundled Mono\""));

    let svg = render_svg(&overlay);
    assert!(
        svg.contains("font-family=\"&quot;Bundled Mono&quot;, DejaVu Sans, Arial, sans-serif\""),
        "{svg}"
    );
}
