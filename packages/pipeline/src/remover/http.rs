use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use super::BackgroundRemover;
use crate::config::RemoverConfig;
use crate::error::ProcessingError;

/// Client for a rembg-compatible removal service.
///
/// The image is posted as the multipart field `file`; the response body is
/// the cut-out image.
pub struct HttpRemover {
    client: reqwest::Client,
    url: String,
}

impl HttpRemover {
    pub fn new(config: &RemoverConfig) -> Result<Self, ProcessingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProcessingError::Removal(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl BackgroundRemover for HttpRemover {
    #[instrument(skip(self, image), fields(size = image.len()))]
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ProcessingError> {
        let part = Part::bytes(image.to_vec()).file_name("photo");
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProcessingError::Removal(format!("Request failed: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProcessingError::Removal(format!("Failed reading body: {e}")))?;

        if !status.is_success() {
            return Err(ProcessingError::Removal(format!(
                "Service returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        debug!(output_size = bytes.len(), "Background removed");
        Ok(bytes.to_vec())
    }
}
