use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use waypoint_core::{CoreError, StorageError};
use waypoint_vault::VaultError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced over the HTTP boundary.
///
/// Vault and storage failures are discriminated here, not stringly
/// merged: a missing backup is 404, a conflicting short code is 409,
/// maintenance mode is 503, and a corrupt restore keeps its distinct
/// fatal wording.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("service is in maintenance mode while a restore is in progress")]
    Maintenance,
    #[error("{0}")]
    Internal(String),
    #[error("fatal: {0}")]
    Corrupt(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Maintenance => "MAINTENANCE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Corrupt(_) => "CORRUPT_STATE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": {
                    "code": self.code(),
                    "message": message,
                },
            })),
        )
            .into_response()
    }
}

impl From<VaultError> for ApiError {
    fn from(value: VaultError) -> Self {
        match value {
            VaultError::NotFound(name) => ApiError::NotFound(format!("backup not found: {name}")),
            VaultError::Storage(message) | VaultError::Backup(message) => {
                ApiError::Internal(message)
            }
            VaultError::CorruptState(message) => ApiError::Corrupt(message),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(code) => {
                ApiError::Conflict(format!("short code already exists: {code}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => {
                ApiError::Validation(format!("invalid short code: {message}"))
            }
        }
    }
}
