//! Server-wide error type

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::registry::RegistryError;
use crate::storage::StorageError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upload failed: {0}")]
    Upload(MultipartError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            },
            AppError::BadRequest(_) | AppError::Storage(StorageError::InvalidId(_)) => {
                StatusCode::BAD_REQUEST
            },
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upload(e) => e.status(),
            AppError::Storage(StorageError::Io(_)) | AppError::Registry(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound(_)) => "NOT_FOUND",
            AppError::BadRequest(_) | AppError::Storage(StorageError::InvalidId(_)) => {
                "VALIDATION_ERROR"
            },
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Upload(_) => "UPLOAD_ERROR",
            AppError::Registry(_) => "REGISTRY_ERROR",
            AppError::Storage(StorageError::Io(_)) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Storage(StorageError::Io(ref e)) => {
                tracing::error!("Storage IO error: {:?}", e);
                "A storage error occurred".to_string()
            },
            AppError::Registry(ref e) => {
                tracing::error!("GBIF registry error: {}", e);
                self.to_string()
            },
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::new(self.code(), message))).into_response()
    }
}
