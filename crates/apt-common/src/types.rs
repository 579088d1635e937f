//! Common types used across APT

use serde::{Deserialize, Serialize};

use crate::error::{AptError, Result};

/// Minimum number of characters in a dataset identifier.
///
/// The storage layout nests files under the first three characters.
pub const MIN_DATASET_ID_LEN: usize = 3;

/// A validated dataset identifier.
///
/// Only ASCII letters, digits, `-`, `_` and `.` are accepted, and the
/// identifier must be at least [`MIN_DATASET_ID_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Parse and validate a raw identifier
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() < MIN_DATASET_ID_LEN || !has_authorized_chars(raw) {
            return Err(AptError::InvalidDatasetId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DatasetId {
    type Err = AptError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for DatasetId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Check that a text only holds characters allowed in identifiers
pub fn has_authorized_chars(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Key assigned by the GBIF registry to a dataset record.
///
/// Opaque and UUID-shaped; APT never generates one itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryKey(String);

impl RegistryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
