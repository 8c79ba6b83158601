use serde::Serialize;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidSource,
    InvalidInput,
    NoAnnotations,
    ImageProcessing,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::InvalidSource => "Invalid source",
            Self::InvalidInput => "Invalid input",
            Self::NoAnnotations => "No annotations",
            Self::ImageProcessing => "Image processing error",
        }
    }
}

/// Terminal failure of one annotation batch. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("input is not a buffer: {0}")]
    InvalidInput(String),
    #[error("no annotations provided")]
    NoAnnotations,
    #[error("image processing failed: {0}")]
    ImageProcessing(#[source] BoxError),
}

impl AnnotateError {
    pub fn processing<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageProcessing(Box::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSource(_) => ErrorKind::InvalidSource,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NoAnnotations => ErrorKind::NoAnnotations,
            Self::ImageProcessing(_) => ErrorKind::ImageProcessing,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
