//! APT Server Library
//!
//! HTTP server hosting Darwin Core archives and keeping the GBIF registry in
//! step with them.
//!
//! # Overview
//!
//! - **Dataset storage**: archives on the local file system, one per identifier
//! - **Registry reconciliation**: registers, re-crawls, revives and deletes
//!   GBIF dataset records as archives are uploaded and removed
//! - **API**: axum routes for upload, download, listing and reports
//!
//! # Startup
//!
//! The registry catalog is loaded before the listener is bound:
//!
//! ```no_run
//! use apt_server::{api, config::Config, registry, storage::DatasetStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let client = registry::GbifRegistryClient::new(&config.registry, &config.publication)?;
//!     let reconciler = Arc::new(registry::Reconciler::new(
//!         Arc::new(client),
//!         config.server.public_url.clone(),
//!         config.registry.publisher_key.clone(),
//!     ));
//!     reconciler.bootstrap().await?;
//!     let storage = DatasetStorage::new(config.storage.clone());
//!     api::serve(api::AppState::new(config, storage, reconciler)).await
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod registry;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
