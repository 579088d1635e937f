//! In-memory view of the registry records owned by this APT
//!
//! Both maps live under one lock so a classification is a single read and a
//! move between maps is a single write. An endpoint is never present in
//! both maps.

use super::types::EndpointId;
use apt_common::types::RegistryKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry status of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetState {
    Unregistered,
    Published(RegistryKey),
    Deleted(RegistryKey),
}

/// Result of trying to add a bootstrap entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The endpoint was already mapped; the existing entry is kept
    Collision { existing: DatasetState },
}

#[derive(Debug, Default)]
struct Maps {
    published: HashMap<EndpointId, RegistryKey>,
    deleted: HashMap<EndpointId, RegistryKey>,
}

#[derive(Debug, Default)]
pub struct RegistryState {
    maps: RwLock<Maps>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        self.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Maps> {
        self.maps.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn classify(&self, endpoint: &EndpointId) -> DatasetState {
        let maps = self.read();
        if let Some(key) = maps.published.get(endpoint) {
            DatasetState::Published(key.clone())
        } else if let Some(key) = maps.deleted.get(endpoint) {
            DatasetState::Deleted(key.clone())
        } else {
            DatasetState::Unregistered
        }
    }

    pub fn published_key(&self, endpoint: &EndpointId) -> Option<RegistryKey> {
        self.read().published.get(endpoint).cloned()
    }

    /// Add a bootstrap entry to `published` unless the endpoint is known
    pub fn insert_published(&self, endpoint: EndpointId, key: RegistryKey) -> InsertOutcome {
        let mut maps = self.write();
        if let Some(existing) = maps.published.get(&endpoint) {
            return InsertOutcome::Collision {
                existing: DatasetState::Published(existing.clone()),
            };
        }
        // Published wins over a deleted record seen earlier
        maps.deleted.remove(&endpoint);
        maps.published.insert(endpoint, key);
        InsertOutcome::Inserted
    }

    /// Add a bootstrap entry to `deleted` unless the endpoint is known
    pub fn insert_deleted(&self, endpoint: EndpointId, key: RegistryKey) -> InsertOutcome {
        let mut maps = self.write();
        if let Some(existing) = maps.published.get(&endpoint) {
            return InsertOutcome::Collision {
                existing: DatasetState::Published(existing.clone()),
            };
        }
        if let Some(existing) = maps.deleted.get(&endpoint) {
            return InsertOutcome::Collision {
                existing: DatasetState::Deleted(existing.clone()),
            };
        }
        maps.deleted.insert(endpoint, key);
        InsertOutcome::Inserted
    }

    /// Record a successful registration or revive
    pub fn mark_published(&self, endpoint: EndpointId, key: RegistryKey) {
        let mut maps = self.write();
        maps.deleted.remove(&endpoint);
        maps.published.insert(endpoint, key);
    }

    /// Record a successful remote deletion
    pub fn mark_deleted(&self, endpoint: EndpointId, key: RegistryKey) {
        let mut maps = self.write();
        maps.published.remove(&endpoint);
        maps.deleted.insert(endpoint, key);
    }

    /// Snapshot of `published`, sorted by endpoint
    pub fn published(&self) -> Vec<(EndpointId, RegistryKey)> {
        sorted(&self.read().published)
    }

    /// Snapshot of `deleted`, sorted by endpoint
    pub fn deleted(&self) -> Vec<(EndpointId, RegistryKey)> {
        sorted(&self.read().deleted)
    }

    pub fn counts(&self) -> (usize, usize) {
        let maps = self.read();
        (maps.published.len(), maps.deleted.len())
    }
}

fn sorted(map: &HashMap<EndpointId, RegistryKey>) -> Vec<(EndpointId, RegistryKey)> {
    let mut entries: Vec<_> = map.iter().map(|(e, k)| (e.clone(), k.clone())).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}
