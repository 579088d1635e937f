//! HTTP client for the GBIF registry API
//!
//! Pure transport: every method maps to one registry operation and never
//! looks at or changes local registry state.

use super::endpoints;
use super::error::{RegistryError, RegistryResult};
use super::types::{DatasetRecord, EndpointId, NewDataset, NewEndpoint, Page};
use crate::config::{PublicationConfig, RegistryConfig};
use apt_common::types::{DatasetId, RegistryKey};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Remote operations the reconciler needs from the registry
#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// One page of datasets published by the configured organization
    async fn list_published_page(&self, offset: u64, limit: u64) -> RegistryResult<Page<DatasetRecord>>;

    /// One page of deleted datasets across all publishers
    async fn list_deleted_page(&self, offset: u64, limit: u64) -> RegistryResult<Page<DatasetRecord>>;

    /// Create a dataset record and attach its endpoint, returning the new key
    async fn register(&self, id: &DatasetId, endpoint: &EndpointId) -> RegistryResult<RegistryKey>;

    async fn trigger_crawl(&self, key: &RegistryKey) -> RegistryResult<()>;

    /// Clear the deleted flag of a record, keeping its key
    async fn revive(&self, key: &RegistryKey) -> RegistryResult<()>;

    async fn delete(&self, key: &RegistryKey) -> RegistryResult<()>;
}

/// reqwest-backed [`RegistryClient`]
pub struct GbifRegistryClient {
    client: Client,
    base_url: String,
    publisher_key: String,
    installation_key: String,
    login: String,
    password: String,
    language: String,
    license: String,
}

impl GbifRegistryClient {
    pub fn new(registry: &RegistryConfig, publication: &PublicationConfig) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(registry.timeout_secs))
            .user_agent(concat!("apt-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::unavailable("client setup", e))?;

        Ok(Self {
            client,
            base_url: registry.url.clone(),
            publisher_key: registry.publisher_key.clone(),
            installation_key: registry.installation_key.clone(),
            login: registry.login.clone(),
            password: registry.password.clone(),
            language: publication.language.clone(),
            license: publication.license.clone(),
        })
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.login, Some(&self.password))
    }

    async fn send(operation: &'static str, request: RequestBuilder) -> RegistryResult<Response> {
        request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| RegistryError::unavailable(operation, e))
    }

    async fn list_page(&self, operation: &'static str, url: String) -> RegistryResult<Page<DatasetRecord>> {
        tracing::debug!(%url, "Fetching registry listing page");
        Self::send(operation, self.client.get(&url))
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::unavailable(operation, e))
    }
}

#[async_trait::async_trait]
impl RegistryClient for GbifRegistryClient {
    async fn list_published_page(&self, offset: u64, limit: u64) -> RegistryResult<Page<DatasetRecord>> {
        let url = endpoints::published_datasets_url(&self.base_url, &self.publisher_key, offset, limit);
        self.list_page("list published datasets", url).await
    }

    async fn list_deleted_page(&self, offset: u64, limit: u64) -> RegistryResult<Page<DatasetRecord>> {
        let url = endpoints::deleted_datasets_url(&self.base_url, offset, limit);
        self.list_page("list deleted datasets", url).await
    }

    #[tracing::instrument(skip(self), fields(dataset_id = %id, endpoint = %endpoint))]
    async fn register(&self, id: &DatasetId, endpoint: &EndpointId) -> RegistryResult<RegistryKey> {
        const OPERATION: &str = "register dataset";

        let body = NewDataset::occurrence(
            id,
            &self.publisher_key,
            &self.installation_key,
            &self.language,
            &self.license,
        );
        let request = self
            .authenticated(self.client.post(endpoints::datasets_url(&self.base_url)))
            .json(&body);
        let key: RegistryKey = Self::send(OPERATION, request)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::unavailable(OPERATION, e))?;

        tracing::info!(gbif_key = %key, "Dataset record created");

        let request = self
            .authenticated(self.client.post(endpoints::dataset_endpoint_url(&self.base_url, &key)))
            .json(&NewEndpoint::dwc_archive(endpoint));
        if let Err(e) = Self::send("attach endpoint", request).await {
            tracing::error!(gbif_key = %key, error = %e, "Dataset record created without endpoint");
            return Err(RegistryError::Inconsistent {
                key,
                reason: format!("endpoint {} could not be attached: {}", endpoint, e),
            });
        }

        tracing::info!(gbif_key = %key, "Endpoint attached");
        Ok(key)
    }

    #[tracing::instrument(skip(self), fields(gbif_key = %key))]
    async fn trigger_crawl(&self, key: &RegistryKey) -> RegistryResult<()> {
        let request = self.authenticated(self.client.post(endpoints::dataset_crawl_url(&self.base_url, key)));
        Self::send("trigger crawl", request).await?;
        tracing::info!("Crawl requested");
        Ok(())
    }

    /// Read-modify-write without a version check: a concurrent edit of the
    /// record between the GET and the PUT is overwritten.
    #[tracing::instrument(skip(self), fields(gbif_key = %key))]
    async fn revive(&self, key: &RegistryKey) -> RegistryResult<()> {
        const OPERATION: &str = "revive dataset";
        let url = endpoints::dataset_url(&self.base_url, key);

        let mut record: serde_json::Value = Self::send(OPERATION, self.client.get(&url))
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::unavailable(OPERATION, e))?;

        let Some(fields) = record.as_object_mut() else {
            return Err(RegistryError::unavailable(OPERATION, "dataset record is not a JSON object"));
        };
        fields.remove("deleted");

        Self::send(OPERATION, self.authenticated(self.client.put(&url)).json(&record)).await?;
        tracing::info!("Dataset record revived");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(gbif_key = %key))]
    async fn delete(&self, key: &RegistryKey) -> RegistryResult<()> {
        let request = self.authenticated(self.client.delete(endpoints::dataset_url(&self.base_url, key)));
        Self::send("delete dataset", request).await?;
        tracing::info!("Dataset record deleted");
        Ok(())
    }
}
