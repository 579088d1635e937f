use crate::api::AppState;
use crate::storage::StorageError;
use apt_common::types::{DatasetId, RegistryKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    /// `true` or `on` (any case) adds GBIF registration details
    #[serde(default)]
    pub gbif: Option<String>,
}

impl ListDatasetsQuery {
    pub fn include_registration(&self) -> bool {
        self.gbif
            .as_deref()
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "on"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetListItem {
    pub id: DatasetId,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub registration: Option<Registration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub gbif_key: Option<RegistryKey>,
    pub registered: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: &AppState,
    query: ListDatasetsQuery,
) -> Result<Vec<DatasetListItem>, ListDatasetsError> {
    let include_registration = query.include_registration();
    let datasets = state.storage.list().await?;

    Ok(datasets
        .into_iter()
        .map(|dataset| {
            let registration = include_registration.then(|| {
                let gbif_key = state.reconciler.registry_key_for(&dataset.id);
                Registration {
                    registered: gbif_key.is_some(),
                    gbif_key,
                }
            });
            DatasetListItem {
                url: state.reconciler.endpoint_for(&dataset.id).to_string(),
                id: dataset.id,
                modified_at: dataset.modified_at,
                registration,
            }
        })
        .collect())
}
