use crate::photo::{PhotoId, PhotoValidationError};

/// Errors that can occur during photo storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No photo is stored under the identifier.
    #[error("photo not found: {0}")]
    NotFound(PhotoId),
    /// The upload was rejected before anything was written.
    #[error(transparent)]
    Invalid(#[from] PhotoValidationError),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}
