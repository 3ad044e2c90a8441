use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::StorageError;
use pipeline::PipelineError;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFIGURATION_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Photo not found")]
    pub message: String,
    /// Failure detail for configuration and internal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Background generation service failed")]
    pub error: Option<String>,
    /// Per-field validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FieldErrors {
    #[schema(example = json!(["File size too large. Maximum size is 10MB"]))]
    pub photo: Vec<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The uploaded photo failed one of the upload checks.
    InvalidPhoto(Vec<String>),
    NotFound(String),
    /// A required setting is missing. The detail is shown to the client.
    Configuration(String),
    /// `message` and `public` reach the client; `detail` is only logged.
    Internal {
        message: &'static str,
        public: &'static str,
        detail: String,
    },
}

impl AppError {
    pub fn photo_not_found() -> Self {
        AppError::NotFound("Photo not found".into())
    }

    /// Map a storage failure, labelling internal errors with `message`.
    pub fn from_storage(err: StorageError, message: &'static str) -> Self {
        match err {
            StorageError::NotFound(_) => Self::photo_not_found(),
            StorageError::Invalid(e) => AppError::InvalidPhoto(vec![e.to_string()]),
            StorageError::Io(e) => AppError::Internal {
                message,
                public: "Photo storage failed",
                detail: e.to_string(),
            },
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                    error: None,
                    errors: None,
                },
            ),
            AppError::InvalidPhoto(messages) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: "Photo not valid".into(),
                    error: None,
                    errors: Some(FieldErrors { photo: messages }),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                    error: None,
                    errors: None,
                },
            ),
            AppError::Configuration(detail) => {
                tracing::error!("Configuration error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "CONFIGURATION_ERROR",
                        message: "Configuration error".into(),
                        error: Some(detail),
                        errors: None,
                    },
                )
            }
            AppError::Internal {
                message,
                public,
                detail,
            } => {
                tracing::error!("{}: {}", message, detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: message.into(),
                        error: Some(public.into()),
                        errors: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::Validation(msg),
            PipelineError::NotFound(msg) => AppError::NotFound(msg),
            PipelineError::Configuration(msg) => AppError::Configuration(msg),
            PipelineError::Processing(e) => AppError::Internal {
                message: "Error generating background",
                public: e.public_message(),
                detail: e.to_string(),
            },
        }
    }
}
