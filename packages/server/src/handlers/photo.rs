use axum::Json;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use common::photo::{self, PhotoValidationError};
use common::PhotoId;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::photo::{
    AddPhotoForm, AddPhotoResponse, MessageResponse, RemovePhotoRequest, provided,
};
use crate::state::AppState;

/// Body limit for uploads. Leaves room for multipart framing so an oversize
/// photo still reaches the size check.
pub fn upload_body_limit(max_photo_size: u64) -> DefaultBodyLimit {
    let limit = max_photo_size.saturating_mul(2).saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/add-photo",
    tag = "Photos",
    operation_id = "addPhoto",
    summary = "Upload a product photo",
    description = "Stores the `photo` multipart file and returns its identifier. Accepted \
        extensions: jpg, jpeg, png, gif, webp (case-insensitive). Maximum size: 10 MB.",
    request_body(content_type = "multipart/form-data", content = AddPhotoForm),
    responses(
        (status = 200, description = "Photo stored", body = AddPhotoResponse),
        (status = 400, description = "No file, or the file failed validation (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn add_photo(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AddPhotoResponse>, AppError> {
    let mut multipart = multipart.map_err(|_| no_photo())?;
    let limit = state.config.storage.max_photo_size;

    let mut upload: Option<Result<(String, Vec<u8>), PhotoValidationError>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if upload.is_some() || field.name() != Some("photo") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        // The body is always read to the end so the client sees the response.
        let extension = photo::accepted_extension(&file_name);
        let (data, size) = read_field(field, extension.is_ok(), limit).await?;
        upload = Some(
            extension
                .and_then(|_| photo::check_size(size, limit))
                .map(|_| (file_name, data)),
        );
    }

    let (file_name, data) = upload
        .ok_or_else(no_photo)?
        .map_err(|e| AppError::InvalidPhoto(vec![e.to_string()]))?;

    let photo = state
        .store
        .add(&data, &file_name)
        .await
        .map_err(|e| AppError::from_storage(e, "Error adding photo"))?;

    info!(photo_id = %photo.id, size = photo.size, "Photo added");
    Ok(Json(photo.into()))
}

#[utoipa::path(
    delete,
    path = "/remove-photo",
    tag = "Photos",
    operation_id = "removePhoto",
    summary = "Delete a stored photo",
    request_body = RemovePhotoRequest,
    responses(
        (status = 200, description = "Photo removed", body = MessageResponse),
        (status = 400, description = "No photo_id given (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown photo (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn remove_photo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RemovePhotoRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let raw = provided(payload.photo_id.as_deref()).ok_or_else(no_photo)?;
    let id: PhotoId = raw.parse().map_err(|_| AppError::photo_not_found())?;

    state
        .store
        .remove(&id)
        .await
        .map_err(|e| AppError::from_storage(e, "Error removing photo"))?;

    info!(photo_id = %id, "Photo removed");
    Ok(Json(MessageResponse {
        message: "Photo removed successfully".into(),
    }))
}

fn no_photo() -> AppError {
    AppError::Validation("Photo not found".into())
}

fn multipart_error(err: MultipartError, limit: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The exact size is unknown once the body limit trips.
        let too_large = PhotoValidationError::TooLarge {
            actual: limit.saturating_add(1),
            limit,
        };
        return AppError::InvalidPhoto(vec![too_large.to_string()]);
    }
    AppError::Validation(format!("Multipart error: {}", err.body_text()))
}

/// Read a field to the end, buffering at most `limit` bytes when `keep` is set.
/// Returns the buffered bytes and the full field size.
async fn read_field(
    mut field: Field<'_>,
    keep: bool,
    limit: u64,
) -> Result<(Vec<u8>, u64), AppError> {
    let mut data = Vec::new();
    let mut size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        size += chunk.len() as u64;
        if keep && size <= limit {
            data.extend_from_slice(&chunk);
        }
    }

    Ok((data, size))
}
