use crate::config::{Config, load_config};
use crate::layout::compute_overlay;
use crate::layout_dump::write_layout_dump;
use crate::node::{AnnotateNode, Message, Property};
use crate::raster::ImageCompositor;
use crate::render::{render_svg, write_output_bytes, write_output_svg};
use crate::text_metrics::{FontMeasurer, register_font_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::executor::block_on;
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "annotate", version, about = "Draw boxes, circles and labels onto an image")]
pub struct Args {
    /// Input image (PNG or JPEG) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Annotations JSON: an array, or an object with an `annotations` field
    #[arg(short = 'a', long = "annotations")]
    pub annotations: PathBuf,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "image")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Label font family
    #[arg(long = "fontFamily")]
    pub font_family: Option<String>,

    /// Default (minimum) label font size
    #[arg(long = "fontSize")]
    pub font_size: Option<f32>,

    /// Font file used for measuring and drawing labels
    #[arg(long = "fontFile")]
    pub font_file: Option<PathBuf>,

    /// Write the resolved shapes as JSON to this path
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The input image with the overlay burned in
    Image,
    /// Only the overlay SVG
    Svg,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let font_file = config.annotate.font_file.clone();
    if let Some(path) = font_file.as_deref() {
        let family = register_font_file(path)?;
        tracing::debug!(family = %family, path = %path.display(), "registered label font");
        config.prefer_font_family(&family);
    }
    let measurer = FontMeasurer::new();
    let mut compositor = ImageCompositor::new(config.settings().font_family());
    if let Some(path) = font_file.as_deref() {
        compositor = compositor.with_font_file(path)?;
    }

    let image = read_input(args.input.as_deref())?;
    let annotations = read_annotations(&args.annotations)?;

    if args.output_format == OutputFormat::Svg || args.dump_layout.is_some() {
        let parsed = crate::ir::parse_annotations(Some(&annotations))
            .ok_or(crate::AnnotateError::NoAnnotations)?;
        let canvas = compositor.probe_sync(&image)?;
        let settings = config.settings();
        let overlay = block_on(compute_overlay(canvas, &parsed, &settings, &measurer))?;
        if let Some(path) = args.dump_layout.as_deref() {
            write_layout_dump(path, &overlay)?;
        }
        if args.output_format == OutputFormat::Svg {
            return write_output_svg(&render_svg(&overlay), args.output.as_deref());
        }
    }

    let msg = Message::new()
        .with_bytes(&config.node.source.path, image)
        .with_json(&config.node.annotations_property, annotations);
    let output_property = config.node.output_property.clone();
    let node = AnnotateNode::new(config, compositor, measurer);

    let out = block_on(node.on_input(msg))
        .map_err(|failure| anyhow::Error::new(failure.error).context(failure.text))?;
    match out.get(&output_property) {
        Some(Property::Bytes(bytes)) => write_output_bytes(bytes, args.output.as_deref()),
        _ => Err(anyhow::anyhow!("msg.{output_property} holds no image")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "image_annotate=info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(family) = &args.font_family {
        config.annotate.font_family = Some(family.clone());
    }
    if let Some(size) = args.font_size {
        config.annotate.font_size = Some(size);
    }
    if let Some(path) = &args.font_file {
        config.annotate.font_file = Some(path.clone());
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_annotations(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(unwrap_annotations(value))
}

/// Accepts either a bare list or a message-shaped object.
fn unwrap_annotations(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("annotations") => {
            map.remove("annotations").unwrap_or(Value::Null)
        }
        other => other,
    }
}
