use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument};

use crate::config::FetchConfig;
use crate::error::ProcessingError;

/// Downloads generated backgrounds.
///
/// Every request is bounded by the configured timeout and never retried.
#[derive(Clone)]
pub struct BackgroundFetcher {
    client: reqwest::Client,
}

impl BackgroundFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ProcessingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProcessingError::Fetch(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch the bytes behind `url`. Inline `data:` URLs are decoded locally.
    #[instrument(skip(self, url))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProcessingError> {
        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_url(rest);
        }

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProcessingError::Fetch("Timed out downloading background".into())
            } else {
                ProcessingError::Fetch(format!("Request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProcessingError::Fetch(format!("Unexpected status {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProcessingError::Fetch(format!("Failed reading body: {e}")))?;
        debug!(size = bytes.len(), "Background downloaded");
        Ok(bytes.to_vec())
    }
}

/// Decode the part of a `data:` URL after the scheme. Only base64 payloads are supported.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, ProcessingError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ProcessingError::Fetch("Malformed data URL".into()))?;
    if !meta.ends_with(";base64") {
        return Err(ProcessingError::Fetch(
            "Only base64 data URLs are supported".into(),
        ));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| ProcessingError::Fetch(format!("Invalid base64 payload: {e}")))
}
