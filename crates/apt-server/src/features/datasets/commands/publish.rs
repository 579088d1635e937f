use crate::api::AppState;
use crate::registry::RegistryError;
use crate::storage::{DatasetStorage, StorageError, StoredDataset};
use apt_common::types::{DatasetId, RegistryKey};
use axum::extract::{multipart::MultipartError, Multipart};
use serde::{Deserialize, Serialize};

/// Multipart field carrying the dataset archive.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishDatasetCommand {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishDatasetResponse {
    pub id: DatasetId,
    pub url: String,
    pub gbif_key: RegistryKey,
    pub registered: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishDatasetError {
    #[error("Invalid dataset identifier: '{0}'")]
    InvalidId(String),
    #[error("Missing dataset file: a 'file' field with a file name is required")]
    MissingFile,
    #[error("Failed to read uploaded file: {0}")]
    Upload(#[from] MultipartError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PublishDatasetCommand {
    pub fn validate(&self) -> Result<DatasetId, PublishDatasetError> {
        DatasetStorage::parse_id(&self.id).map_err(|_| PublishDatasetError::InvalidId(self.id.clone()))
    }
}

/// Store the uploaded archive, then register it (or refresh it) in GBIF
///
/// The file stays in place when the registry call fails; a new upload of the
/// same dataset retries the registration.
#[tracing::instrument(skip(state, command, upload), fields(dataset_id = %command.id))]
pub async fn handle(
    state: &AppState,
    command: PublishDatasetCommand,
    mut upload: Multipart,
) -> Result<PublishDatasetResponse, PublishDatasetError> {
    let id = command.validate()?;

    let stored = receive_file(&state.storage, &id, &mut upload).await?;
    tracing::info!(size = stored.size, "Dataset file stored");

    let gbif_key = state.reconciler.reconcile_publish(&id).await?;

    Ok(PublishDatasetResponse {
        url: state.reconciler.endpoint_for(&id).to_string(),
        id,
        gbif_key,
        registered: true,
    })
}

async fn receive_file(
    storage: &DatasetStorage,
    id: &DatasetId,
    upload: &mut Multipart,
) -> Result<StoredDataset, PublishDatasetError> {
    while let Some(mut field) = upload.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().map_or(true, |name| name.trim().is_empty()) {
            return Err(PublishDatasetError::MissingFile);
        }

        let mut staged = storage.stage(id).await?;
        while let Some(chunk) = field.chunk().await? {
            staged.write(&chunk).await?;
        }
        return Ok(staged.commit().await?);
    }

    Err(PublishDatasetError::MissingFile)
}
