//! Configuration management
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file). Required values have no default: a missing one aborts
//! startup with a message naming the variable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::storage::config::{StorageConfig, DEFAULT_RESOURCES_PATH};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default upload size limit (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

// ============================================================================
// Registry Configuration Constants
// ============================================================================

/// GBIF UAT registry, used unless `GBIF_REGISTRY_URL` points elsewhere.
pub const DEFAULT_REGISTRY_URL: &str = "https://api.gbif-uat.org";

/// Per-request timeout against the registry.
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 60;

/// Default publication license (CC BY 4.0).
pub const DEFAULT_PUBLICATION_LICENSE: &str =
    "http://creativecommons.org/licenses/by/4.0/legalcode";

/// Default publication language (ISO 639-2).
pub const DEFAULT_PUBLICATION_LANGUAGE: &str = "eng";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub publication: PublicationConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Public base URL of this APT, without trailing slash
    pub public_url: String,
    pub max_upload_bytes: usize,
}

/// GBIF registry access
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry API base URL, without trailing slash
    pub url: String,
    pub publisher_key: String,
    pub installation_key: String,
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("publisher_key", &self.publisher_key)
            .field("installation_key", &self.installation_key)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Defaults applied to newly registered datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationConfig {
    pub language: String,
    pub license: String,
}

/// Guards for the mutating dataset endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Expected value of the `X-API-Key` header
    #[serde(skip_serializing)]
    pub api_key: String,
    /// When set, `X-Real-IP` must match
    pub authorized_ip: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &"<redacted>")
            .field("authorized_ip", &self.authorized_ip)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} is required. APT is closing.", name))
        };

        let config = Config {
            server: ServerConfig {
                host: var("APT_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parse_opt(var("APT_PORT")).unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: parse_opt(var("APT_SHUTDOWN_TIMEOUT"))
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
                public_url: trim_url(&required("APT_PUBLIC_URL")?),
                max_upload_bytes: parse_opt(var("APT_MAX_UPLOAD_BYTES"))
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            registry: RegistryConfig {
                url: trim_url(
                    &var("GBIF_REGISTRY_URL").unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string()),
                ),
                publisher_key: required("PUBLISHER_KEY")?,
                installation_key: required("INSTALLATION_KEY")?,
                login: required("GBIF_REGISTRY_LOGIN")?,
                password: required("GBIF_REGISTRY_PASSWORD")?,
                timeout_secs: parse_opt(var("GBIF_REGISTRY_TIMEOUT_SECS"))
                    .unwrap_or(DEFAULT_REGISTRY_TIMEOUT_SECS),
            },
            publication: PublicationConfig {
                language: var("PUBLICATION_LANGUAGE")
                    .unwrap_or_else(|| DEFAULT_PUBLICATION_LANGUAGE.to_string()),
                license: var("PUBLICATION_LICENSE")
                    .unwrap_or_else(|| DEFAULT_PUBLICATION_LICENSE.to_string()),
            },
            security: SecurityConfig {
                api_key: required("API_KEY")?,
                authorized_ip: var("AUTHORIZED_IP"),
            },
            storage: StorageConfig {
                resources_path: PathBuf::from(
                    var("APT_RESOURCES_PATH").unwrap_or_else(|| DEFAULT_RESOURCES_PATH.to_string()),
                ),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        for (name, url) in [
            ("APT_PUBLIC_URL", &self.server.public_url),
            ("GBIF_REGISTRY_URL", &self.registry.url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must start with http:// or https:// (got '{}')", name, url);
            }
        }

        if self.registry.timeout_secs == 0 {
            anyhow::bail!("GBIF_REGISTRY_TIMEOUT_SECS must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("APT_MAX_UPLOAD_BYTES must be greater than 0");
        }

        Ok(())
    }

    /// Log the startup banner. Secrets are never included.
    pub fn log_banner(&self) {
        tracing::info!("APT: Automated Publishing Toolkit");
        tracing::info!(
            public_url = %self.server.public_url,
            publisher_key = %self.registry.publisher_key,
            installation_key = %self.registry.installation_key,
            "Publishing identity"
        );
        tracing::info!(
            registry = %self.registry.url,
            account = %self.registry.login,
            "GBIF registry"
        );
        tracing::info!("Mutating dataset endpoints require the X-API-Key header");
        if let Some(ref ip) = self.security.authorized_ip {
            tracing::info!(authorized_ip = %ip, "Mutating dataset endpoints restricted to one address");
        }
    }
}

fn parse_opt<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
