//! Authorization of mutating dataset requests
//!
//! Handlers that take an [`Authorized`] argument only run when the request
//! carries the configured `X-API-Key`, and, if `AUTHORIZED_IP` is set, a
//! matching `X-Real-IP` header (set by the fronting proxy).

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::AppState;
use crate::config::SecurityConfig;
use crate::error::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Proof that the request passed [`verify`]
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[axum::async_trait]
impl FromRequestParts<AppState> for Authorized {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        verify(&state.config.security, parts)?;
        Ok(Authorized)
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check the API key and, when configured, the client address
pub fn verify(security: &SecurityConfig, parts: &Parts) -> Result<(), AppError> {
    if let Some(ref allowed) = security.authorized_ip {
        let real_ip = header(parts, REAL_IP_HEADER);
        if real_ip != Some(allowed.as_str()) {
            tracing::warn!(
                real_ip = real_ip.unwrap_or("<missing>"),
                "Rejected request from unauthorized address"
            );
            return Err(AppError::Forbidden("Client address is not authorized".to_string()));
        }
    }

    match header(parts, API_KEY_HEADER) {
        Some(key) if key == security.api_key => Ok(()),
        Some(_) => {
            tracing::warn!(path = %parts.uri.path(), "Rejected request with wrong API key");
            Err(AppError::Forbidden("Invalid API key".to_string()))
        },
        None => {
            tracing::warn!(path = %parts.uri.path(), "Rejected request without API key");
            Err(AppError::Forbidden("Missing X-API-Key header".to_string()))
        },
    }
}
