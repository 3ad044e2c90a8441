mod openai;

use async_trait::async_trait;

use crate::error::Result;

pub use openai::OpenAiGenerator;

/// Hosted text-to-image service producing product backgrounds.
#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    /// Fail fast with `PipelineError::Configuration` when the generator cannot
    /// possibly succeed, before any other pipeline work is done.
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Generate one background for `prompt`, returning a fetchable URL.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
