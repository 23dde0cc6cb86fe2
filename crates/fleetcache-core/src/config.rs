//! Client configuration.
//!
//! The API base URL and request timeout come from the environment, falling
//! back to the local development server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default API base, the local development backend.
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Read configuration from `FLEETCACHE_API_URL` and
    /// `FLEETCACHE_TIMEOUT_SECS`, defaulting anything unset.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("FLEETCACHE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let request_timeout_secs = match std::env::var("FLEETCACHE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("Invalid FLEETCACHE_TIMEOUT_SECS value: {}", raw))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            base_url,
            request_timeout_secs,
        })
    }
}
