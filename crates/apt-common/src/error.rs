//! Error types for APT

use thiserror::Error;

/// Result type alias for APT operations
pub type Result<T> = std::result::Result<T, AptError>;

/// Main error type for APT
#[derive(Error, Debug)]
pub enum AptError {
    #[error("Invalid dataset identifier '{0}': only letters, digits, '-', '_' and '.' are allowed, with at least 3 characters")]
    InvalidDatasetId(String),
}
