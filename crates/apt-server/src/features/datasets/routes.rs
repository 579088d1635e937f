//! Dataset API routes
//!
//! - `GET /dataset` - List stored datasets (`?gbif=true` adds registration details)
//! - `GET /dataset/:id` - Download a dataset archive
//! - `POST /dataset/:id` - Upload a dataset archive and publish it to GBIF
//! - `DELETE /dataset/:id` - Delete a dataset archive and its GBIF record
//!
//! Mutating routes require the `X-API-Key` header.

use crate::api::AppState;
use crate::error::AppError;
use crate::middleware::Authorized;
use axum::{
    extract::{Multipart, Path, Query, Request, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{
    commands::{
        DeleteDatasetCommand, DeleteDatasetError, PublishDatasetCommand, PublishDatasetError,
    },
    queries::{DownloadDatasetError, DownloadDatasetQuery, ListDatasetsError, ListDatasetsQuery},
};

// ============================================================================
// Router Configuration
// ============================================================================

pub fn datasets_routes() -> Router<AppState> {
    Router::new().route("/", get(list_datasets)).route(
        "/:id",
        get(download_dataset)
            .post(publish_dataset)
            .delete(delete_dataset),
    )
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Upload a dataset archive
///
/// # Endpoint
///
/// `POST /dataset/:id` with a multipart `file` field
///
/// # Response
///
/// - `200 OK` - `{"id", "url", "gbif_key", "registered": true}`
/// - `400 Bad Request` - Invalid identifier or missing file
/// - `403 Forbidden` - Missing or wrong API key
/// - `500 Internal Server Error` - Storage or GBIF registry failure
#[tracing::instrument(skip(state, upload), fields(dataset_id = %id))]
async fn publish_dataset(
    _auth: Authorized,
    State(state): State<AppState>,
    Path(id): Path<String>,
    upload: Multipart,
) -> Result<Response, AppError> {
    let response =
        super::commands::publish::handle(&state, PublishDatasetCommand { id }, upload).await?;

    tracing::info!(
        gbif_key = %response.gbif_key,
        url = %response.url,
        "Dataset published via API"
    );

    Ok(Json(response).into_response())
}

/// Delete a dataset archive
///
/// # Response
///
/// - `200 OK` - `{"id", "deleted": "done"}`
/// - `400 Bad Request` - Invalid identifier
/// - `403 Forbidden` - Missing or wrong API key
/// - `404 Not Found` - No archive stored under this identifier
/// - `500 Internal Server Error` - Storage or GBIF registry failure
#[tracing::instrument(skip(state), fields(dataset_id = %id))]
async fn delete_dataset(
    _auth: Authorized,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let response = super::commands::delete::handle(&state, DeleteDatasetCommand { id }).await?;

    tracing::info!(gbif_key = ?response.gbif_key, "Dataset deleted via API");

    Ok(Json(response).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(state))]
async fn list_datasets(
    State(state): State<AppState>,
    Query(query): Query<ListDatasetsQuery>,
) -> Result<Response, AppError> {
    let datasets = super::queries::list::handle(&state, query).await?;
    Ok(Json(datasets).into_response())
}

#[tracing::instrument(skip(state, request), fields(dataset_id = %id))]
async fn download_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let dataset = super::queries::download::handle(&state.storage, DownloadDatasetQuery { id }).await?;

    tracing::debug!(path = %dataset.path.display(), size = dataset.size, "Serving dataset archive");

    let response = ServeFile::new(&dataset.path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.into_response())
}

// ============================================================================
// Error Mapping
// ============================================================================

impl From<PublishDatasetError> for AppError {
    fn from(err: PublishDatasetError) -> Self {
        match err {
            PublishDatasetError::InvalidId(_) | PublishDatasetError::MissingFile => {
                AppError::BadRequest(err.to_string())
            },
            PublishDatasetError::Upload(e) => AppError::Upload(e),
            PublishDatasetError::Storage(e) => AppError::Storage(e),
            PublishDatasetError::Registry(e) => AppError::Registry(e),
        }
    }
}

impl From<DeleteDatasetError> for AppError {
    fn from(err: DeleteDatasetError) -> Self {
        match err {
            DeleteDatasetError::InvalidId(_) => AppError::BadRequest(err.to_string()),
            DeleteDatasetError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteDatasetError::Storage(e) => AppError::Storage(e),
            DeleteDatasetError::Registry(e) => AppError::Registry(e),
        }
    }
}

impl From<ListDatasetsError> for AppError {
    fn from(err: ListDatasetsError) -> Self {
        match err {
            ListDatasetsError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<DownloadDatasetError> for AppError {
    fn from(err: DownloadDatasetError) -> Self {
        match err {
            DownloadDatasetError::InvalidId(_) => AppError::BadRequest(err.to_string()),
            DownloadDatasetError::NotFound(_) => AppError::NotFound(err.to_string()),
            DownloadDatasetError::Storage(e) => AppError::Storage(e),
        }
    }
}
