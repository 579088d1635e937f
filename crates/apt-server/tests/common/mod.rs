//! Shared helpers for APT server integration tests
//!
//! - [`FakeRegistry`]: in-process [`RegistryClient`] recording every call
//! - configuration builders for a test APT instance

#![allow(dead_code)]

use apt_common::types::{DatasetId, RegistryKey};
use apt_server::config::Config;
use apt_server::registry::{
    DatasetRecord, Endpoint, EndpointId, Page, RegistryClient, RegistryError, RegistryResult,
    PAGE_SIZE,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const PUBLIC_URL: &str = "https://apt.example.org";
pub const PUBLISHER_KEY: &str = "pub-0001";
pub const API_KEY: &str = "test-api-key";

/// Environment of a test APT instance
pub fn test_env(registry_url: &str, resources: &Path) -> HashMap<&'static str, String> {
    HashMap::from([
        ("APT_PUBLIC_URL", PUBLIC_URL.to_string()),
        ("PUBLISHER_KEY", PUBLISHER_KEY.to_string()),
        ("INSTALLATION_KEY", "inst-0001".to_string()),
        ("GBIF_REGISTRY_LOGIN", "apt-bot".to_string()),
        ("GBIF_REGISTRY_PASSWORD", "bot-password".to_string()),
        ("GBIF_REGISTRY_URL", registry_url.to_string()),
        ("GBIF_REGISTRY_TIMEOUT_SECS", "2".to_string()),
        ("API_KEY", API_KEY.to_string()),
        ("APT_RESOURCES_PATH", resources.display().to_string()),
    ])
}

pub fn config_from(env: &HashMap<&'static str, String>) -> Config {
    Config::from_lookup(|name| env.get(name).cloned()).unwrap()
}

pub fn test_config(registry_url: &str, resources: &Path) -> Config {
    config_from(&test_env(registry_url, resources))
}

pub fn dataset_id(raw: &str) -> DatasetId {
    DatasetId::parse(raw).unwrap()
}

pub fn endpoint(id: &str) -> EndpointId {
    EndpointId::for_dataset(PUBLIC_URL, &dataset_id(id))
}

pub fn record(key: &str, publisher: Option<&str>, urls: &[&str]) -> DatasetRecord {
    DatasetRecord {
        key: RegistryKey::new(key),
        publishing_organization_key: publisher.map(str::to_string),
        endpoints: urls.iter().map(|u| Endpoint { url: u.to_string() }).collect(),
    }
}

pub fn page(results: Vec<DatasetRecord>, end_of_records: bool) -> Page<DatasetRecord> {
    Page {
        results,
        end_of_records,
    }
}

/// A remote call observed by [`FakeRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPublished(u64),
    ListDeleted(u64),
    Register(DatasetId),
    Crawl(RegistryKey),
    Revive(RegistryKey),
    Delete(RegistryKey),
}

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Register,
    AttachEndpoint,
    Crawl,
    Revive,
    Delete,
}

#[derive(Default)]
pub struct FakeRegistry {
    published_pages: Vec<Page<DatasetRecord>>,
    deleted_pages: Vec<Page<DatasetRecord>>,
    calls: Mutex<Vec<Call>>,
    next_key: AtomicUsize,
    failing: Mutex<HashSet<Op>>,
    delay: Option<Duration>,
    gate: Option<(DatasetId, Arc<Notify>)>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_published_pages(mut self, pages: Vec<Page<DatasetRecord>>) -> Self {
        self.published_pages = pages;
        self
    }

    pub fn with_deleted_pages(mut self, pages: Vec<Page<DatasetRecord>>) -> Self {
        self.deleted_pages = pages;
        self
    }

    /// Delay every mutating call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold `register` for `id` until the returned handle is notified
    pub fn with_gate(mut self, id: &str) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        self.gate = Some((dataset_id(id), Arc::clone(&notify)));
        (self, notify)
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    /// Calls other than listings
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ListPublished(_) | Call::ListDeleted(_)))
            .collect()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: Op) -> RegistryResult<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(RegistryError::unavailable("fake", format!("{op:?} failed")));
        }
        Ok(())
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn page_at(pages: &[Page<DatasetRecord>], offset: u64) -> Page<DatasetRecord> {
        pages
            .get((offset / PAGE_SIZE) as usize)
            .cloned()
            .unwrap_or_else(|| page(Vec::new(), true))
    }
}

#[async_trait::async_trait]
impl RegistryClient for FakeRegistry {
    async fn list_published_page(&self, offset: u64, _limit: u64) -> RegistryResult<Page<DatasetRecord>> {
        self.record_call(Call::ListPublished(offset));
        self.check(Op::List)?;
        Ok(Self::page_at(&self.published_pages, offset))
    }

    async fn list_deleted_page(&self, offset: u64, _limit: u64) -> RegistryResult<Page<DatasetRecord>> {
        self.record_call(Call::ListDeleted(offset));
        self.check(Op::List)?;
        Ok(Self::page_at(&self.deleted_pages, offset))
    }

    async fn register(&self, id: &DatasetId, _endpoint: &EndpointId) -> RegistryResult<RegistryKey> {
        self.record_call(Call::Register(id.clone()));
        if let Some((gated, notify)) = &self.gate {
            if gated == id {
                notify.notified().await;
            }
        }
        self.pause().await;
        self.check(Op::Register)?;
        let key = RegistryKey::new(format!("key-{}", self.next_key.fetch_add(1, Ordering::SeqCst) + 1));
        if self.check(Op::AttachEndpoint).is_err() {
            return Err(RegistryError::Inconsistent {
                key,
                reason: "endpoint not attached".to_string(),
            });
        }
        Ok(key)
    }

    async fn trigger_crawl(&self, key: &RegistryKey) -> RegistryResult<()> {
        self.record_call(Call::Crawl(key.clone()));
        self.pause().await;
        self.check(Op::Crawl)
    }

    async fn revive(&self, key: &RegistryKey) -> RegistryResult<()> {
        self.record_call(Call::Revive(key.clone()));
        self.pause().await;
        self.check(Op::Revive)
    }

    async fn delete(&self, key: &RegistryKey) -> RegistryResult<()> {
        self.record_call(Call::Delete(key.clone()));
        self.pause().await;
        self.check(Op::Delete)
    }
}
