use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct GenerateBackgroundRequest {
    #[schema(example = "0192f5c8-7d1e-7abc-8000-000000000001")]
    pub photo_id: Option<String>,
    /// Optional scene description, e.g. "wood table".
    #[schema(example = "wood table")]
    pub context: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerateBackgroundResponse {
    /// PNG composite as an inline data URL.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub background: String,
}
