use axum::Json;
use axum::extract::State;
use common::PhotoId;
use pipeline::GenerationRequest;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::background::{GenerateBackgroundRequest, GenerateBackgroundResponse};
use crate::models::photo::provided;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/generate-background",
    tag = "Backgrounds",
    operation_id = "generateBackground",
    summary = "Place a stored photo on a generated background",
    description = "Removes the photo's background, generates a new scene from the optional \
        `context`, and returns the centered composite as a PNG data URL. The canvas is at \
        least 50 px larger than the product on every side.",
    request_body = GenerateBackgroundRequest,
    responses(
        (status = 200, description = "Composite generated", body = GenerateBackgroundResponse),
        (status = 400, description = "No photo_id given (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown photo (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Missing credential (CONFIGURATION_ERROR) or a failed step (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn generate_background(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateBackgroundRequest>,
) -> Result<Json<GenerateBackgroundResponse>, AppError> {
    let raw = provided(payload.photo_id.as_deref())
        .ok_or_else(|| AppError::Validation("Photo ID not provided".into()))?;
    let photo_id: PhotoId = raw.parse().map_err(|_| AppError::photo_not_found())?;

    let request = GenerationRequest::new(photo_id, payload.context);
    let result = state.pipeline.generate(&request).await?;

    Ok(Json(GenerateBackgroundResponse {
        background: result.data_url,
    }))
}
