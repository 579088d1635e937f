use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root directory for dataset archives unless `APT_RESOURCES_PATH` is set.
pub const DEFAULT_RESOURCES_PATH: &str = "/usr/data/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub resources_path: PathBuf,
}

impl StorageConfig {
    pub fn new(resources_path: impl Into<PathBuf>) -> Self {
        Self {
            resources_path: resources_path.into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCES_PATH)
    }
}
