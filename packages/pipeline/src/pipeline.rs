use std::sync::Arc;

use common::{PhotoId, PhotoStore, StorageError};
use image::RgbaImage;
use tracing::{info, instrument};

use crate::compositor::{CompositeResult, Compositor};
use crate::error::{PipelineError, ProcessingError, Result};
use crate::generator::BackgroundGenerator;
use crate::prompt::build_prompt;
use crate::remover::BackgroundRemover;
use crate::stage::StageTracker;

/// A request to place a stored photo onto a freshly generated background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub photo_id: PhotoId,
    /// Scene description. Blank values are treated as absent.
    pub context: Option<String>,
}

impl GenerationRequest {
    pub fn new(photo_id: PhotoId, context: Option<String>) -> Self {
        let context = context
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self { photo_id, context }
    }
}

/// Runs remove, generate and composite for one photo.
pub struct BackgroundPipeline {
    store: Arc<dyn PhotoStore>,
    remover: Arc<dyn BackgroundRemover>,
    generator: Arc<dyn BackgroundGenerator>,
    compositor: Compositor,
}

impl BackgroundPipeline {
    pub fn new(
        store: Arc<dyn PhotoStore>,
        remover: Arc<dyn BackgroundRemover>,
        generator: Arc<dyn BackgroundGenerator>,
        compositor: Compositor,
    ) -> Self {
        Self {
            store,
            remover,
            generator,
            compositor,
        }
    }

    #[instrument(skip_all, fields(photo_id = %request.photo_id))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<CompositeResult> {
        let mut tracker = StageTracker::new();
        match self.run(request, &mut tracker).await {
            Ok(result) => {
                tracker.advance();
                info!(width = result.width, height = result.height, "Background generated");
                Ok(result)
            }
            Err(err) => {
                tracker.fail(err.kind());
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        tracker: &mut StageTracker,
    ) -> Result<CompositeResult> {
        let (photo, _) = self
            .store
            .get(&request.photo_id)
            .await
            .map_err(storage_error)?;
        self.generator.ensure_configured()?;
        tracker.advance();

        let cutout = self.remover.remove_background(&photo).await?;
        let product = decode_cutout(cutout).await?;
        tracker.advance();

        let prompt = build_prompt(request.context.as_deref());
        let background_url = self.generator.generate(&prompt).await?;
        tracker.advance();

        let result = self.compositor.composite(product, &background_url).await?;
        tracker.advance();
        Ok(result)
    }
}

fn storage_error(err: StorageError) -> PipelineError {
    match err {
        StorageError::NotFound(_) => PipelineError::NotFound("Photo not found".into()),
        other => ProcessingError::Storage(other.to_string()).into(),
    }
}

async fn decode_cutout(data: Vec<u8>) -> std::result::Result<RgbaImage, ProcessingError> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&data)
            .map(|img| img.to_rgba8())
            .map_err(|e| ProcessingError::Decode(format!("cut-out: {e}")))
    })
    .await?
}
