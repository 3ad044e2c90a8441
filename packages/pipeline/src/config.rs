use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Image-generation service configuration.
#[derive(Deserialize, Clone)]
pub struct GeneratorConfig {
    /// Bearer credential for the image-generation API. Required at request time.
    #[serde(default)]
    pub api_key: Option<String>,
    /// API root. Default: "https://api.openai.com/v1".
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    /// Square output size. Default: "1024x1024".
    #[serde(default = "default_generator_size")]
    pub size: String,
    #[serde(default = "default_generator_quality")]
    pub quality: String,
    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generator_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_generator_model() -> String {
    "dall-e-3".into()
}
fn default_generator_size() -> String {
    "1024x1024".into()
}
fn default_generator_quality() -> String {
    "standard".into()
}
fn default_generator_timeout_secs() -> u64 {
    120
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The credential, if set to something other than whitespace.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generator_base_url(),
            model: default_generator_model(),
            size: default_generator_size(),
            quality: default_generator_quality(),
            timeout_secs: default_generator_timeout_secs(),
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &self.credential().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which background-removal implementation to use.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoverBackend {
    /// rembg-compatible HTTP service.
    #[default]
    Http,
    /// Local ONNX model. Needs the `onnx` cargo feature.
    Onnx,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoverConfig {
    #[serde(default)]
    pub backend: RemoverBackend,
    /// Endpoint for the HTTP backend. Default: "http://127.0.0.1:7000/api/remove".
    #[serde(default = "default_remover_url")]
    pub url: String,
    #[serde(default = "default_remover_timeout_secs")]
    pub timeout_secs: u64,
    /// Segmentation model path for the ONNX backend.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

fn default_remover_url() -> String {
    "http://127.0.0.1:7000/api/remove".into()
}
fn default_remover_timeout_secs() -> u64 {
    120
}

impl RemoverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            backend: RemoverBackend::default(),
            url: default_remover_url(),
            timeout_secs: default_remover_timeout_secs(),
            model_path: None,
        }
    }
}

/// Background download configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Upper bound for the whole download. Default: 30.
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}
