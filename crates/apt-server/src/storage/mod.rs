//! File-backed dataset storage
//!
//! Archives live under the resources root, nested by the first three
//! characters of their identifier: `abc123` is stored at
//! `{root}/a/b/c/abc123.zip`.

use apt_common::types::DatasetId;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

pub mod config;

pub use config::StorageConfig;

const ARCHIVE_EXTENSION: &str = "zip";

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid dataset identifier: '{0}'")]
    InvalidId(String),
    #[error("Dataset '{0}' not found")]
    NotFound(DatasetId),
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone)]
pub struct DatasetStorage {
    root: PathBuf,
}

/// A dataset archive found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDataset {
    pub id: DatasetId,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl DatasetStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            root: config.resources_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a raw identifier taken from a request path
    pub fn parse_id(raw: &str) -> StorageResult<DatasetId> {
        DatasetId::parse(raw).map_err(|_| StorageError::InvalidId(raw.to_string()))
    }

    /// Directory holding the archive of `id`
    fn dir_for(&self, id: &DatasetId) -> PathBuf {
        let mut dir = self.root.clone();
        // DatasetId guarantees at least three characters
        for c in id.as_str().chars().take(3) {
            dir.push(c.to_string());
        }
        dir
    }

    pub fn path_for(&self, id: &DatasetId) -> PathBuf {
        self.dir_for(id)
            .join(format!("{}.{}", id.as_str(), ARCHIVE_EXTENSION))
    }

    /// Open a staging file next to the final archive location
    ///
    /// Bytes written to the returned [`StagedDataset`] only replace the
    /// current archive once [`StagedDataset::commit`] succeeds.
    #[instrument(skip(self), fields(dataset_id = %id))]
    pub async fn stage(&self, id: &DatasetId) -> StorageResult<StagedDataset> {
        let dir = self.dir_for(id);
        fs::create_dir_all(&dir).await?;

        let sequence = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = dir.join(format!(
            ".{}.{}.{}.part",
            id.as_str(),
            std::process::id(),
            sequence
        ));
        let file = fs::File::create(&temp_path).await?;

        debug!(path = %temp_path.display(), "Staging dataset upload");

        Ok(StagedDataset {
            id: id.clone(),
            file: Some(file),
            temp_path,
            final_path: self.path_for(id),
            size: 0,
        })
    }

    /// Store a complete archive in one call
    pub async fn save(&self, id: &DatasetId, data: &[u8]) -> StorageResult<StoredDataset> {
        let mut staged = self.stage(id).await?;
        staged.write(data).await?;
        staged.commit().await
    }

    #[instrument(skip(self), fields(dataset_id = %id))]
    pub async fn exists(&self, id: &DatasetId) -> StorageResult<bool> {
        Ok(fs::try_exists(self.path_for(id)).await?)
    }

    #[instrument(skip(self), fields(dataset_id = %id))]
    pub async fn remove(&self, id: &DatasetId) -> StorageResult<()> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => {
                info!("Dataset archive removed");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.clone()))
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn metadata(&self, id: &DatasetId) -> StorageResult<StoredDataset> {
        match fs::metadata(self.path_for(id)).await {
            Ok(meta) => Ok(StoredDataset {
                id: id.clone(),
                size: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.clone()))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Walk the resources root and return every stored archive, sorted by id
    ///
    /// Files whose stem is not a valid identifier (including staging files)
    /// are skipped.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StorageResult<Vec<StoredDataset>> {
        let mut datasets = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
                    continue;
                }
                let Some(id) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| DatasetId::parse(s).ok())
                else {
                    warn!(path = %path.display(), "Skipping archive with invalid identifier");
                    continue;
                };
                let meta = entry.metadata().await?;
                datasets.push(StoredDataset {
                    id,
                    size: meta.len(),
                    modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        datasets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(datasets)
    }
}

/// An in-progress upload
///
/// Dropping it without calling [`commit`](Self::commit) removes the staging
/// file.
#[derive(Debug)]
pub struct StagedDataset {
    id: DatasetId,
    file: Option<fs::File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    size: u64,
}

impl StagedDataset {
    pub async fn write(&mut self, chunk: &[u8]) -> StorageResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(chunk).await?;
            self.size += chunk.len() as u64;
        }
        Ok(())
    }

    /// Flush and atomically move the staging file over the final archive
    #[instrument(skip(self), fields(dataset_id = %self.id, size = self.size))]
    pub async fn commit(mut self) -> StorageResult<StoredDataset> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        fs::rename(&self.temp_path, &self.final_path).await?;

        info!(path = %self.final_path.display(), "Dataset archive stored");

        let modified_at = fs::metadata(&self.final_path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        Ok(StoredDataset {
            id: self.id.clone(),
            size: self.size,
            modified_at,
        })
    }
}

impl Drop for StagedDataset {
    fn drop(&mut self) {
        // After a successful rename the staging path no longer exists
        if self.temp_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                warn!(path = %self.temp_path.display(), error = %e, "Failed to remove staging file");
            }
        }
    }
}
