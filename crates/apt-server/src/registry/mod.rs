//! GBIF registry reconciliation
//!
//! Keeps the GBIF registry in step with the datasets hosted by this APT:
//!
//! - [`client`]: HTTP calls to the registry API
//! - [`state`]: in-memory published/deleted maps
//! - [`bootstrap`]: startup load of the registry catalog
//! - [`reconciler`]: per-dataset register / crawl / revive / delete

pub mod bootstrap;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod locks;
pub mod reconciler;
pub mod state;
pub mod types;

pub use bootstrap::{BootstrapReport, ListingReport, PAGE_SIZE};
pub use client::{GbifRegistryClient, RegistryClient};
pub use error::{RegistryError, RegistryResult};
pub use reconciler::{DeleteOutcome, Reconciler};
pub use state::DatasetState;
pub use types::{DatasetRecord, Endpoint, EndpointId, Page};
