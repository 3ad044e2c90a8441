pub mod compositor;
pub mod config;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod remover;
pub mod stage;

pub use compositor::{CompositeResult, Compositor};
pub use config::{FetchConfig, GeneratorConfig, RemoverBackend, RemoverConfig};
pub use error::{PipelineError, ProcessingError, Result};
pub use fetch::BackgroundFetcher;
pub use generator::{BackgroundGenerator, OpenAiGenerator};
pub use pipeline::{BackgroundPipeline, GenerationRequest};
pub use remover::{BackgroundRemover, HttpRemover};
pub use stage::{FailureKind, Stage, StageTracker};
