//! APT Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the APT (Automated
//! Publishing Toolkit) workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`AptError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by every binary
//! - **Types**: validated dataset identifiers and registry keys
//!
//! # Example
//!
//! ```no_run
//! use apt_common::types::DatasetId;
//!
//! fn check(raw: &str) -> apt_common::Result<()> {
//!     let id = DatasetId::parse(raw)?;
//!     tracing::info!(dataset_id = %id, "Identifier accepted");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{AptError, Result};
