//! Registry reports: datasets this APT has published to or deleted from GBIF

pub mod queries;
pub mod routes;

pub use queries::ReportEntry;
pub use routes::reports_routes;
