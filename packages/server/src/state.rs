use std::sync::Arc;

use anyhow::Context;
use common::{FilesystemPhotoStore, PhotoStore};
use pipeline::{BackgroundFetcher, BackgroundPipeline, Compositor, OpenAiGenerator};
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PhotoStore>,
    pub pipeline: Arc<BackgroundPipeline>,
}

impl AppState {
    /// Open the photo store and wire up the generation pipeline.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = FilesystemPhotoStore::open(
            config.storage.photos_dir.clone(),
            config.storage.max_photo_size,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open photo store at {}",
                config.storage.photos_dir.display()
            )
        })?;
        info!(photos = store.len(), "Photo store ready");
        let store: Arc<dyn PhotoStore> = Arc::new(store);

        let remover =
            pipeline::remover::from_config(&config.remover).context("Failed to set up remover")?;

        if config.generator.credential().is_none() {
            warn!("No image generation credential configured; generate-background will fail");
        }
        let generator = Arc::new(
            OpenAiGenerator::new(config.generator.clone())
                .context("Failed to set up background generator")?,
        );

        let fetcher = BackgroundFetcher::new(&config.fetch).context("Failed to set up fetcher")?;

        let pipeline = Arc::new(BackgroundPipeline::new(
            Arc::clone(&store),
            remover,
            generator,
            Compositor::new(fetcher),
        ));

        Ok(Self {
            config,
            store,
            pipeline,
        })
    }
}
