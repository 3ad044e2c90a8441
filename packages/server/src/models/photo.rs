use chrono::{DateTime, Utc};
use common::Photo;
use serde::{Deserialize, Serialize};

/// Multipart upload body. Documentation only; the handler reads the stream directly.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AddPhotoForm {
    /// Image file (jpg, jpeg, png, gif or webp, at most 10 MB).
    #[schema(value_type = String, format = Binary)]
    pub photo: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AddPhotoResponse {
    #[schema(example = "Photo added successfully")]
    pub message: String,
    /// Photo identifier (UUIDv7).
    #[schema(example = "0192f5c8-7d1e-7abc-8000-000000000001")]
    pub photo_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Photo> for AddPhotoResponse {
    fn from(photo: Photo) -> Self {
        Self {
            message: "Photo added successfully".into(),
            photo_id: photo.id.to_string(),
            created_at: photo.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RemovePhotoRequest {
    #[schema(example = "0192f5c8-7d1e-7abc-8000-000000000001")]
    pub photo_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Photo removed successfully")]
    pub message: String,
}

/// Treat absent and blank identifiers alike.
pub fn provided(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}
