//! Client configuration.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `OPENAI_API_KEY` | yes | - | Bearer credential |
//! | `OPENAI_BASE_URL` | no | `https://api.openai.com/v1` | API endpoint override |
//! | `OPENAI_TIMEOUT_SECS` | no | `60` | Per-request HTTP timeout |
//!
//! The environment is read once by [`ClientConfig::from_env`]; the resulting
//! value is passed explicitly to the invoker.

use std::fmt;
use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::retry::BackoffPolicy;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const TIMEOUT_ENV: &str = "OPENAI_TIMEOUT_SECS";

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Credential, endpoint and retry settings for one invoker.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: BackoffPolicy,
}

impl ClientConfig {
    /// Config with the given key and default endpoint, timeout and retry policy.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: BackoffPolicy::default(),
        }
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] if `OPENAI_API_KEY` is unset or empty,
    /// or `OPENAI_TIMEOUT_SECS` is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV).ok_or_else(|| {
            LlmError::ConfigError(format!(
                "{} environment variable not set. \
                 Please set it with: export {}=your-api-key",
                API_KEY_ENV, API_KEY_ENV
            ))
        })?;

        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError(format!(
                "{} is empty. Please set a valid API key.",
                API_KEY_ENV
            )));
        }

        let mut config = Self::new(api_key.trim());

        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LlmError::ConfigError(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_ENV, raw
                ))
            })?;
            if secs == 0 {
                return Err(LlmError::ConfigError(format!(
                    "{} must be greater than zero",
                    TIMEOUT_ENV
                )));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: BackoffPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Full URL for an endpoint path relative to the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}
