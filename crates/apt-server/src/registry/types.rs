//! Wire types exchanged with the GBIF registry API

use apt_common::types::{DatasetId, RegistryKey};
use serde::{Deserialize, Serialize};

/// Dataset type declared on registration.
pub const DATASET_TYPE_OCCURRENCE: &str = "OCCURRENCE";

/// Endpoint type attached to every registered dataset.
pub const ENDPOINT_TYPE_DWC_ARCHIVE: &str = "DWC_ARCHIVE";

/// Public download URL of a dataset, the join key between local files and
/// registry records
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// `{public_url}/dataset/{id}`
    pub fn for_dataset(public_url: &str, id: &DatasetId) -> Self {
        Self(format!("{}/dataset/{}", public_url, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a registry listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub end_of_records: bool,
}

/// Registry dataset record as returned by the listing endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub key: RegistryKey,
    #[serde(default)]
    pub publishing_organization_key: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl DatasetRecord {
    pub fn endpoint_ids(&self) -> impl Iterator<Item = EndpointId> + '_ {
        self.endpoints.iter().map(|e| EndpointId::new(e.url.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub url: String,
}

/// Body of `POST /v1/dataset`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataset {
    pub publishing_organization_key: String,
    pub installation_key: String,
    #[serde(rename = "type")]
    pub dataset_type: &'static str,
    pub title: String,
    pub description: String,
    pub language: String,
    pub license: String,
}

impl NewDataset {
    pub fn occurrence(
        id: &DatasetId,
        publisher_key: &str,
        installation_key: &str,
        language: &str,
        license: &str,
    ) -> Self {
        let title = format!("Dataset {}", id);
        Self {
            publishing_organization_key: publisher_key.to_string(),
            installation_key: installation_key.to_string(),
            dataset_type: DATASET_TYPE_OCCURRENCE,
            description: title.clone(),
            title,
            language: language.to_string(),
            license: license.to_string(),
        }
    }
}

/// Body of `POST /v1/dataset/{key}/endpoint`
#[derive(Debug, Clone, Serialize)]
pub struct NewEndpoint {
    #[serde(rename = "type")]
    pub endpoint_type: &'static str,
    pub url: String,
}

impl NewEndpoint {
    pub fn dwc_archive(endpoint: &EndpointId) -> Self {
        Self {
            endpoint_type: ENDPOINT_TYPE_DWC_ARCHIVE,
            url: endpoint.to_string(),
        }
    }
}
