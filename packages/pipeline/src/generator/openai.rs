use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::BackgroundGenerator;
use crate::config::GeneratorConfig;
use crate::error::{PipelineError, ProcessingError, Result};

const MISSING_CREDENTIAL: &str = "OPENAI_API_KEY is not set in environment variables";

#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

/// Client for an OpenAI-compatible `/images/generations` endpoint.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    /// Build the client. A missing credential is not an error here; it is
    /// reported per request as a configuration error.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/images/generations",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .credential()
            .ok_or_else(|| PipelineError::Configuration(MISSING_CREDENTIAL.into()))
    }
}

#[async_trait]
impl BackgroundGenerator for OpenAiGenerator {
    fn ensure_configured(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;

        let request = ImagesGenerateRequest {
            model: &self.config.model,
            prompt,
            n: 1,
            size: &self.config.size,
            quality: &self.config.quality,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProcessingError::Generation(format!("Request failed: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProcessingError::Generation(format!("Failed reading body: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ApiErrorResponse>(&bytes)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ProcessingError::Generation(format!("API error {status}: {detail}")).into());
        }

        let parsed: ImagesGenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ProcessingError::Generation(format!("Malformed response: {e}")))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProcessingError::Generation("No image data returned".into()))?;

        let url = match (first.url, first.b64_json) {
            (Some(url), _) => url,
            (None, Some(b64)) => format!("data:image/png;base64,{b64}"),
            (None, None) => {
                return Err(
                    ProcessingError::Generation("Image response missing url and b64_json".into())
                        .into(),
                );
            }
        };

        debug!("Background generated");
        Ok(url)
    }
}
