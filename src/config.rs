//! Connection settings for the identity platform
//!
//! Options are plain data. [`ClientOptions::from_env`] fills them from the
//! process environment; the binary loads a `.env` file first.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.clerk.com";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const SECRET_KEY_VAR: &str = "CLERK_SECRET_KEY";
pub const API_URL_VAR: &str = "CLERK_API_URL";
pub const API_VERSION_VAR: &str = "CLERK_API_VERSION";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

/// Settings used to build an [`HttpBackend`](crate::http::HttpBackend)
///
/// # Examples
///
/// ```
/// use clerk_guard::config::ClientOptions;
///
/// let options = ClientOptions::new("sk_test_123").with_api_url("http://localhost:8080");
/// assert_eq!(options.base_url(), "http://localhost:8080/v1");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub secret_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    concat!("clerk-guard/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientOptions {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_url: default_api_url(),
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }

    /// Reads `CLERK_SECRET_KEY`, `CLERK_API_URL` and `CLERK_API_VERSION`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup(SECRET_KEY_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(SECRET_KEY_VAR))?;

        let mut options = Self::new(secret_key);
        if let Some(url) = lookup(API_URL_VAR).filter(|v| !v.is_empty()) {
            options.api_url = url;
        }
        if let Some(version) = lookup(API_VERSION_VAR).filter(|v| !v.is_empty()) {
            options.api_version = version;
        }
        Ok(options)
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `api_url` and `api_version` joined, without a trailing slash
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
