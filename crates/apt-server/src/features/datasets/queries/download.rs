use crate::storage::{DatasetStorage, StorageError};
use apt_common::types::DatasetId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDatasetQuery {
    pub id: String,
}

/// Location of a stored archive, ready to be streamed
#[derive(Debug, Clone)]
pub struct DownloadDatasetResponse {
    pub id: DatasetId,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadDatasetError {
    #[error("Invalid dataset identifier: '{0}'")]
    InvalidId(String),
    #[error("Dataset '{0}' not found")]
    NotFound(DatasetId),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for DownloadDatasetError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl DownloadDatasetQuery {
    pub fn validate(&self) -> Result<DatasetId, DownloadDatasetError> {
        DatasetStorage::parse_id(&self.id).map_err(|_| DownloadDatasetError::InvalidId(self.id.clone()))
    }
}

#[tracing::instrument(skip(storage))]
pub async fn handle(
    storage: &DatasetStorage,
    query: DownloadDatasetQuery,
) -> Result<DownloadDatasetResponse, DownloadDatasetError> {
    let id = query.validate()?;
    let stored = storage.metadata(&id).await?;

    Ok(DownloadDatasetResponse {
        path: storage.path_for(&id),
        id,
        size: stored.size,
    })
}
