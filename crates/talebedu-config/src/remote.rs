//! Remote backend configuration.
//!
//! The remote side is a PostgREST-compatible REST endpoint (the hosted
//! Supabase project in production).
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`: project base URL, e.g. `https://xyz.supabase.co` (no default)
//! - `SUPABASE_ANON_KEY`: API key sent as `apikey` and bearer token (default: empty)
//! - `REMOTE_TIMEOUT_SECONDS`: per-request timeout of the HTTP client (default: `30`)

use std::env;
use std::time::Duration;

/// Location and credentials of the remote data API.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the backend. `None` means no remote is configured and the
    /// layer runs purely locally.
    pub base_url: Option<String>,

    /// API key for the REST endpoint.
    pub api_key: String,

    /// Timeout applied by the HTTP client to every request.
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("SUPABASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            api_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                env::var("REMOTE_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Configuration pointing at an explicit base URL.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = RemoteConfig::new("https://example.supabase.co/", "key");
        assert_eq!(config.base_url.as_deref(), Some("https://example.supabase.co"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = RemoteConfig::new("http://localhost", "super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_with_timeout() {
        let config = RemoteConfig::default().with_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert!(config.base_url.is_none());
    }
}
