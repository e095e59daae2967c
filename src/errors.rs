use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::db::DbError;
use crate::media::MediaError;
use crate::models::ErrorResponse;
use crate::object_store::ObjectStoreError;

/// Request failure taxonomy. Client-input problems are 400, credential and
/// ownership problems 401, local tooling failures 500, remote dependency
/// failures 502.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("upload exceeds the size cap")]
    PayloadTooLarge,
    #[error("video not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("staging failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error("persist failed: {0}")]
    Persist(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Persist(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The caller sees the category; the detail stays in the log.
        let (status, public) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::UnsupportedMediaType => {
                (StatusCode::BAD_REQUEST, "Unsupported media type".to_string())
            }
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Upload exceeds the size limit".to_string(),
            ),
            ApiError::NotFound => (StatusCode::BAD_REQUEST, "Unable to find video".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Auth(AuthError::MissingHeader | AuthError::MalformedHeader) => (
                StatusCode::UNAUTHORIZED,
                "Couldn't find JWT".to_string(),
            ),
            ApiError::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                "Couldn't validate JWT".to_string(),
            ),
            ApiError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to save upload".to_string(),
            ),
            ApiError::Media(MediaError::Remux(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to process video".to_string(),
            ),
            ApiError::Media(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to get aspect ratio".to_string(),
            ),
            ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "Unable to upload video".to_string()),
            ApiError::Persist(_) => (StatusCode::BAD_GATEWAY, "Unable to update video".to_string()),
        };

        if status.is_server_error() {
            error!("❌ [{}] {}", status.as_u16(), self);
        } else {
            warn!("[{}] {}", status.as_u16(), self);
        }

        (status, Json(ErrorResponse { error: public })).into_response()
    }
}
