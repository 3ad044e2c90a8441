use common::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use pipeline::{FetchConfig, GeneratorConfig, RemoverConfig};
use serde::Deserialize;

/// Environment variable naming an alternative config file (without extension).
pub const CONFIG_PATH_ENV: &str = "BACKDROP_CONFIG";

/// Conventional credential variable, consulted when `generator.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin; empty allows none.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub remover: RemoverConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            // Load from config/config.toml
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., BACKDROP__SERVER__PORT)
            .add_source(
                Environment::with_prefix("BACKDROP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.fill_credential(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Use `fallback` as the generator credential unless one is already configured.
    pub fn fill_credential(&mut self, fallback: Option<String>) {
        if self.generator.credential().is_none() {
            self.generator.api_key = fallback.filter(|key| !key.trim().is_empty());
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
