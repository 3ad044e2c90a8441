use thiserror::Error;

use crate::stage::FailureKind;

/// Failures inside a pipeline step that are the server's or a collaborator's fault.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Background removal failed: {0}")]
    Removal(String),

    #[error("Background generation failed: {0}")]
    Generation(String),

    #[error("Background fetch failed: {0}")]
    Fetch(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Photo storage failed: {0}")]
    Storage(String),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl ProcessingError {
    /// Client-safe description. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Removal(_) => "Background removal failed",
            Self::Generation(_) => "Background generation service failed",
            Self::Fetch(_) => "Could not download the generated background",
            Self::Decode(_) => "Could not decode image",
            Self::Encode(_) => "Could not encode the composite image",
            Self::Storage(_) => "Photo storage failed",
            Self::Task(_) => "Image processing was interrupted",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Required configuration (such as the generation credential) is missing.
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Configuration(_) => FailureKind::Configuration,
            Self::Processing(_) => FailureKind::Processing,
        }
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProcessingError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
