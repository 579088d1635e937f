//! Drives per-dataset registry transitions
//!
//! Each reconciliation classifies the dataset from [`RegistryState`], makes
//! the matching remote call and records the outcome. The sequence holds the
//! dataset's lock from classification to state update; the state lock itself
//! is only taken for the read and the final write.
//!
//! The sequence runs on its own task. A caller that goes away (client
//! disconnect, shutdown deadline) stops waiting for the result, but the remote
//! outcome is still recorded.

use super::bootstrap::{self, BootstrapReport, Filter};
use super::client::RegistryClient;
use super::error::{RegistryError, RegistryResult};
use super::locks::KeyedLocks;
use super::state::{DatasetState, RegistryState};
use super::types::EndpointId;
use apt_common::types::{DatasetId, RegistryKey};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::Instrument;

/// Outcome of a delete reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { key: RegistryKey },
    /// The dataset was not published; no remote call was made
    NothingToDelete,
}

pub struct Reconciler {
    inner: Arc<Inner>,
    public_url: String,
    publisher_key: String,
}

/// Everything a detached reconciliation task needs
struct Inner {
    client: Arc<dyn RegistryClient>,
    state: RegistryState,
    locks: KeyedLocks,
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn RegistryClient>,
        public_url: impl Into<String>,
        publisher_key: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                state: RegistryState::new(),
                locks: KeyedLocks::new(),
            }),
            public_url: public_url.into(),
            publisher_key: publisher_key.into(),
        }
    }

    pub fn endpoint_for(&self, id: &DatasetId) -> EndpointId {
        EndpointId::for_dataset(&self.public_url, id)
    }

    pub fn classify(&self, id: &DatasetId) -> DatasetState {
        self.inner.state.classify(&self.endpoint_for(id))
    }

    /// Load the registry catalog into the local state
    pub async fn bootstrap(&self) -> RegistryResult<BootstrapReport> {
        let filter = Filter {
            public_url: &self.public_url,
            publisher_key: &self.publisher_key,
        };
        bootstrap::run(self.inner.client.as_ref(), &self.inner.state, &filter).await
    }

    /// Make the registry reflect a freshly stored dataset file
    ///
    /// Registers unknown datasets, revives deleted ones and asks for a new
    /// crawl of published ones. Returns the dataset's registry key.
    #[tracing::instrument(skip(self), fields(dataset_id = %id))]
    pub async fn reconcile_publish(&self, id: &DatasetId) -> RegistryResult<RegistryKey> {
        let inner = Arc::clone(&self.inner);
        let endpoint = self.endpoint_for(id);
        let task_id = id.clone();

        let task = tokio::spawn(
            async move {
                inner
                    .publish(&task_id, endpoint)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Registry publish failed"))
            }
            .instrument(tracing::Span::current()),
        );

        task.await
            .map_err(|e| task_failed("publish", e))?
            .map_err(|e| e.for_dataset(id))
    }

    /// Remove a published dataset from the registry
    #[tracing::instrument(skip(self), fields(dataset_id = %id))]
    pub async fn reconcile_delete(&self, id: &DatasetId) -> RegistryResult<DeleteOutcome> {
        let inner = Arc::clone(&self.inner);
        let endpoint = self.endpoint_for(id);

        let task = tokio::spawn(
            async move {
                inner
                    .delete(endpoint)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Registry delete failed"))
            }
            .instrument(tracing::Span::current()),
        );

        task.await
            .map_err(|e| task_failed("delete", e))?
            .map_err(|e| e.for_dataset(id))
    }

    pub fn list_published(&self) -> Vec<(EndpointId, RegistryKey)> {
        self.inner.state.published()
    }

    pub fn list_deleted(&self) -> Vec<(EndpointId, RegistryKey)> {
        self.inner.state.deleted()
    }

    /// Registry key of a published dataset
    pub fn registry_key_for(&self, id: &DatasetId) -> Option<RegistryKey> {
        self.inner.state.published_key(&self.endpoint_for(id))
    }
}

impl Inner {
    async fn publish(&self, id: &DatasetId, endpoint: EndpointId) -> RegistryResult<RegistryKey> {
        let _guard = self.locks.lock(&endpoint).await;

        match self.state.classify(&endpoint) {
            DatasetState::Unregistered => {
                tracing::info!("Dataset not yet registered, registering");
                let key = self.client.register(id, &endpoint).await?;
                self.state.mark_published(endpoint, key.clone());
                Ok(key)
            },
            DatasetState::Published(key) => {
                tracing::info!(gbif_key = %key, "Dataset already registered, triggering crawl");
                self.client.trigger_crawl(&key).await?;
                Ok(key)
            },
            DatasetState::Deleted(key) => {
                tracing::info!(gbif_key = %key, "Dataset previously deleted, reviving");
                self.client.revive(&key).await?;
                self.state.mark_published(endpoint, key.clone());
                Ok(key)
            },
        }
    }

    async fn delete(&self, endpoint: EndpointId) -> RegistryResult<DeleteOutcome> {
        let _guard = self.locks.lock(&endpoint).await;

        let key = match self.state.classify(&endpoint) {
            DatasetState::Published(key) => key,
            state => {
                tracing::info!(?state, "Dataset not published, nothing to delete");
                return Ok(DeleteOutcome::NothingToDelete);
            },
        };

        self.client.delete(&key).await?;
        self.state.mark_deleted(endpoint, key.clone());
        tracing::info!(gbif_key = %key, "Dataset deleted from registry");
        Ok(DeleteOutcome::Deleted { key })
    }
}

fn task_failed(operation: &'static str, err: JoinError) -> RegistryError {
    tracing::error!(operation, error = %err, "Reconciliation task did not complete");
    RegistryError::unavailable(operation, err)
}
