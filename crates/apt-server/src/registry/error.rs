use apt_common::types::{DatasetId, RegistryKey};

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Transport failure, non-2xx status or undecodable body
    #[error("GBIF registry unavailable during {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Registry update failed for dataset '{dataset_id}': {source}")]
    RegistrationFailed {
        dataset_id: DatasetId,
        #[source]
        source: Box<RegistryError>,
    },

    /// The dataset record exists remotely but is not in the expected shape
    #[error("Registry record {key} left inconsistent: {reason}")]
    Inconsistent { key: RegistryKey, reason: String },
}

impl RegistryError {
    pub fn unavailable(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            operation,
            message: err.to_string(),
        }
    }

    /// Wrap a remote failure for `dataset_id`, leaving inconsistencies as they are
    pub fn for_dataset(self, dataset_id: &DatasetId) -> Self {
        match self {
            err @ (Self::Inconsistent { .. } | Self::RegistrationFailed { .. }) => err,
            err => Self::RegistrationFailed {
                dataset_id: dataset_id.clone(),
                source: Box::new(err),
            },
        }
    }
}
