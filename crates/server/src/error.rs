use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use bloomery_core::errors::{StorefrontError, ValidationError};
use bloomery_db::repositories::RepositoryError;

/// Error envelope returned by every JSON endpoint: `{ "message": "..." }`,
/// the shape the storefront frontend expects.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Error sending email.")]
    Mail,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Mail | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<StorefrontError> for ApiError {
    fn from(error: StorefrontError) -> Self {
        match error {
            StorefrontError::Validation(validation) => validation.into(),
            not_found @ StorefrontError::NotFound { .. } => {
                Self::NotFound(not_found.user_message())
            }
            store @ StorefrontError::Store(_) => {
                error!(event_name = "api.store_error", error = %store, "store operation failed");
                Self::Internal(store.user_message())
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        error!(event_name = "api.repository_error", error = %error, "repository operation failed");
        // Storage details stay in the log, not in the response.
        Self::Internal("storage operation failed".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(_) => "Something went wrong.".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}
