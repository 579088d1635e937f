//! Feature modules implementing the APT API
//!
//! Each feature is a vertical slice with its own commands (write
//! operations), queries (read operations) and routes.
//!
//! - **datasets**: upload, download, list and delete dataset archives
//! - **reports**: GBIF registration reports

pub mod datasets;
pub mod reports;

use crate::api::AppState;
use axum::Router;

/// Creates the router with all feature routes mounted
///
/// - `/dataset` - Dataset archives
/// - `/report` - Registry reports
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/dataset", datasets::datasets_routes())
        .nest("/report", reports::reports_routes())
}
