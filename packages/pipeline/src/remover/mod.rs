mod http;
#[cfg(feature = "onnx")]
mod onnx;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{RemoverBackend, RemoverConfig};
use crate::error::{PipelineError, ProcessingError};

pub use http::HttpRemover;
#[cfg(feature = "onnx")]
pub use onnx::OnnxRemover;

/// Strips the background from a product photo.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Take encoded image bytes and return an encoded image whose background
    /// pixels are transparent.
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ProcessingError>;
}

/// Build the remover selected by `config.backend`.
pub fn from_config(config: &RemoverConfig) -> Result<Arc<dyn BackgroundRemover>, PipelineError> {
    match config.backend {
        RemoverBackend::Http => Ok(Arc::new(HttpRemover::new(config)?)),
        #[cfg(feature = "onnx")]
        RemoverBackend::Onnx => {
            let path = config.model_path.as_deref().ok_or_else(|| {
                PipelineError::Configuration("remover.model_path is required for the onnx backend".into())
            })?;
            Ok(Arc::new(OnnxRemover::from_file(path)?))
        }
        #[cfg(not(feature = "onnx"))]
        RemoverBackend::Onnx => Err(PipelineError::Configuration(
            "The onnx remover backend requires building with the `onnx` feature".into(),
        )),
    }
}
