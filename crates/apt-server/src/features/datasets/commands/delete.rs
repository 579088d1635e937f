use crate::api::AppState;
use crate::registry::{DeleteOutcome, RegistryError};
use crate::storage::{DatasetStorage, StorageError};
use apt_common::types::{DatasetId, RegistryKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetCommand {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetResponse {
    pub id: DatasetId,
    pub deleted: String,
    /// Registry record that was deleted along with the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gbif_key: Option<RegistryKey>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteDatasetError {
    #[error("Invalid dataset identifier: '{0}'")]
    InvalidId(String),
    #[error("Dataset '{0}' not found")]
    NotFound(DatasetId),
    #[error(transparent)]
    Storage(StorageError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<StorageError> for DeleteDatasetError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl DeleteDatasetCommand {
    pub fn validate(&self) -> Result<DatasetId, DeleteDatasetError> {
        DatasetStorage::parse_id(&self.id).map_err(|_| DeleteDatasetError::InvalidId(self.id.clone()))
    }
}

/// Delete the registry record first, then the local file
///
/// A failed registry call leaves the file in place so the deletion can be
/// retried.
#[tracing::instrument(skip(state, command), fields(dataset_id = %command.id))]
pub async fn handle(
    state: &AppState,
    command: DeleteDatasetCommand,
) -> Result<DeleteDatasetResponse, DeleteDatasetError> {
    let id = command.validate()?;

    if !state.storage.exists(&id).await? {
        return Err(DeleteDatasetError::NotFound(id));
    }

    let gbif_key = match state.reconciler.reconcile_delete(&id).await? {
        DeleteOutcome::Deleted { key } => Some(key),
        DeleteOutcome::NothingToDelete => None,
    };

    state.storage.remove(&id).await?;

    Ok(DeleteDatasetResponse {
        id,
        deleted: "done".to_string(),
        gbif_key,
    })
}
