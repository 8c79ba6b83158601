//! Message plumbing around the engine: pulls the image and annotation list out
//! of an incoming message and reports failures with the message attached.

use crate::compositor::Compositor;
use crate::config::{Config, DataSource, SourceKind};
use crate::error::{AnnotateError, ErrorKind, Result};
use crate::ir::parse_annotations;
use crate::text_metrics::TextMeasurer;
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bytes(Vec<u8>),
    Json(Value),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyRef<'a> {
    Bytes(&'a [u8]),
    Json(&'a Value),
}

/// A property bag carried through the flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    properties: BTreeMap<String, Property>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, key: &str, bytes: Vec<u8>) -> Self {
        self.set(key, Property::Bytes(bytes));
        self
    }

    pub fn with_json(mut self, key: &str, value: Value) -> Self {
        self.set(key, Property::Json(value));
        self
    }

    pub fn set(&mut self, key: &str, value: Property) {
        self.properties.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn json(&self, key: &str) -> Option<&Value> {
        match self.properties.get(key)? {
            Property::Json(value) => Some(value),
            Property::Bytes(_) => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.properties.get(key)? {
            Property::Bytes(bytes) => Some(bytes),
            Property::Json(_) => None,
        }
    }

    /// Looks up a dotted path. Segments after the first descend into JSON.
    pub fn lookup(&self, path: &str) -> Option<PropertyRef<'_>> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut current = match self.properties.get(head)? {
            Property::Bytes(bytes) => PropertyRef::Bytes(bytes),
            Property::Json(value) => PropertyRef::Json(value),
        };
        for segment in segments {
            let PropertyRef::Json(value) = current else {
                return None;
            };
            let next = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
            current = PropertyRef::Json(next);
        }
        Some(current)
    }
}

impl DataSource {
    /// The image bytes this source points at.
    pub fn resolve<'m>(&self, msg: &'m Message) -> Result<&'m [u8]> {
        match self.kind {
            SourceKind::Msg => {
                let path = self.path.trim();
                if path.is_empty() || path.split('.').any(str::is_empty) {
                    return Err(AnnotateError::InvalidSource(format!(
                        "'{}' is not a valid property path",
                        self.path
                    )));
                }
                match msg.lookup(path) {
                    None => Err(AnnotateError::InvalidSource(format!("msg.{path} is not set"))),
                    Some(PropertyRef::Bytes(bytes)) => Ok(bytes),
                    Some(PropertyRef::Json(value)) => Err(AnnotateError::InvalidInput(format!(
                        "msg.{path} is {}",
                        json_type_name(value)
                    ))),
                }
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A failed batch: what went wrong and the message that triggered it.
#[derive(Debug)]
pub struct Failure {
    pub kind: ErrorKind,
    pub text: &'static str,
    pub error: AnnotateError,
    pub message: Message,
}

pub struct AnnotateNode<C, M> {
    config: Config,
    compositor: C,
    measurer: M,
}

impl<C: Compositor, M: TextMeasurer> AnnotateNode<C, M> {
    pub fn new(config: Config, compositor: C, measurer: M) -> Self {
        Self {
            config,
            compositor,
            measurer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Annotates the image in `msg` and stores the result on the output
    /// property. On failure the message comes back with an `error` property.
    pub async fn on_input(&self, mut msg: Message) -> std::result::Result<Message, Failure> {
        match self.process(&msg).await {
            Ok(bytes) => {
                msg.set(&self.config.node.output_property, Property::Bytes(bytes));
                Ok(msg)
            }
            Err(error) => {
                let kind = error.kind();
                tracing::error!(kind = ?kind, error = %error, "{}", kind.label());
                msg.set(
                    "error",
                    Property::Json(json!({
                        "kind": kind,
                        "message": error.to_string(),
                    })),
                );
                Err(Failure {
                    kind,
                    text: kind.label(),
                    error,
                    message: msg,
                })
            }
        }
    }

    async fn process(&self, msg: &Message) -> Result<Vec<u8>> {
        let node = &self.config.node;
        let image = node.source.resolve(msg)?;
        let annotations = parse_annotations(msg.json(&node.annotations_property))
            .ok_or(AnnotateError::NoAnnotations)?;
        crate::annotate(
            image,
            &annotations,
            &self.config.settings(),
            &self.compositor,
            &self.measurer,
        )
        .await
    }
}
