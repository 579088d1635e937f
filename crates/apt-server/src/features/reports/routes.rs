//! Report API routes
//!
//! - `GET /report/registered` - `[{url, key}]` of datasets published to GBIF
//! - `GET /report/deleted` - `[{url, key}]` of datasets deleted from GBIF

use crate::api::AppState;
use axum::{extract::State, routing::get, Json, Router};

use super::queries::{self, ReportEntry};

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/registered", get(registered_report))
        .route("/deleted", get(deleted_report))
}

async fn registered_report(State(state): State<AppState>) -> Json<Vec<ReportEntry>> {
    Json(queries::registered(&state.reconciler))
}

async fn deleted_report(State(state): State<AppState>) -> Json<Vec<ReportEntry>> {
    Json(queries::deleted(&state.reconciler))
}
