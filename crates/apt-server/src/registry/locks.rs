//! Per-endpoint async locks
//!
//! Reconciliations of the same dataset run one at a time; different datasets
//! never wait on each other. Entries are dropped from the table once the
//! last holder or waiter goes away, including waiters cancelled while queued.

use super::types::EndpointId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Table = Arc<Mutex<HashMap<EndpointId, Arc<AsyncMutex<()>>>>>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Table,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, endpoint: &EndpointId) -> KeyedGuard {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(endpoint.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        // Built before waiting so a cancelled waiter still cleans up its entry
        let mut pending = KeyedGuard {
            table: Arc::clone(&self.table),
            endpoint: endpoint.clone(),
            slot,
            guard: None,
        };
        pending.guard = Some(Arc::clone(&pending.slot).lock_owned().await);
        pending
    }

    /// Number of endpoints with a holder or waiter
    pub fn active(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct KeyedGuard {
    table: Table,
    endpoint: EndpointId,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        // Release before inspecting the count so the guard's own reference is gone
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table and one in this guard: nobody else waits
        if Arc::strong_count(&self.slot) == 2 {
            table.remove(&self.endpoint);
        }
    }
}
