//! APT Server - Main entry point

use anyhow::{Context, Result};
use apt_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tracing::info;

use apt_server::{
    api::{self, AppState},
    config::Config,
    registry::{GbifRegistryClient, Reconciler},
    storage::DatasetStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("apt-server")
        .filter_directives("apt_server=debug,tower_http=debug")
        .build()
        .with_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = Config::load()?;
    config.log_banner();

    let client = GbifRegistryClient::new(&config.registry, &config.publication)
        .context("Failed to create GBIF registry client")?;
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(client),
        config.server.public_url.clone(),
        config.registry.publisher_key.clone(),
    ));

    // The listener is only bound once the registry view is complete
    let report = reconciler
        .bootstrap()
        .await
        .context("Failed to load datasets from the GBIF registry")?;
    info!(
        published = report.published.kept,
        deleted = report.deleted.kept,
        pages = report.published.pages + report.deleted.pages,
        collisions = report.collisions(),
        "GBIF registry loaded"
    );

    let storage = DatasetStorage::new(config.storage.clone());
    info!(root = %storage.root().display(), "Dataset storage ready");

    api::serve(AppState::new(config, storage, reconciler)).await
}
