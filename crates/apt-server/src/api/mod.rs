pub mod response;

use crate::config::Config;
use crate::features;
use crate::middleware;
use crate::registry::Reconciler;
use crate::storage::DatasetStorage;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: DatasetStorage,
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(config: Config, storage: DatasetStorage, reconciler: Arc<Reconciler>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            reconciler,
        }
    }
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let server = &state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    let shutdown_timeout = Duration::from_secs(server.shutdown_timeout_secs);

    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    // In-flight requests get a bounded window once a shutdown signal arrives
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(timeout_secs = shutdown_timeout.as_secs(), "Graceful shutdown timed out");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(features::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::tracing_layer())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": "APT: Automated Publishing Toolkit",
        "version": env!("CARGO_PKG_VERSION"),
        "public_url": state.config.server.public_url,
        "publisher_key": state.config.registry.publisher_key,
        "status": "running"
    }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
