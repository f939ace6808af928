//! Configuration module for loading `VECTORIZER_*` environment settings.
//!
//! Settings are read once per process through [`settings`] and shared
//! read-only afterwards. [`Config::from_lookup`] builds a config from any
//! key lookup so the validation rules can be exercised without touching the
//! process environment.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::ConfigError;

/// Prefix shared by every environment variable this server reads.
pub const ENV_PREFIX: &str = "VECTORIZER_";

/// Default Vectorizer.AI API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.vectorizer.ai/api/v1";

/// Default request timeout in seconds. Vectorization of large images is slow.
pub const DEFAULT_TIMEOUT_SECS: f64 = 180.0;

/// Upper bound for the request timeout in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 600.0;

/// API secret that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Wrap a raw secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the raw secret for request signing.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret(**********)")
    }
}

impl fmt::Display for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("**********")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Vectorizer.AI API id (required, non-empty)
    pub api_id: String,
    /// Vectorizer.AI API secret (required)
    pub api_secret: ApiSecret,
    /// Base URL for the Vectorizer.AI API, without trailing slash
    pub api_base_url: String,
    /// Timeout applied to each vectorization or account request
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables and `.env` file.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnvVar` if `VECTORIZER_API_ID` or
    /// `VECTORIZER_API_SECRET` is not set, and `ConfigError::InvalidValue`
    /// for an empty API id or an out-of-range timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `lookup` receives full variable names (`VECTORIZER_API_ID`, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let api_id = var("API_ID").ok_or_else(|| ConfigError::missing_env_var("VECTORIZER_API_ID"))?;
        if api_id.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "VECTORIZER_API_ID",
                "must contain at least 1 character",
            ));
        }

        let api_secret = var("API_SECRET")
            .map(ApiSecret::new)
            .ok_or_else(|| ConfigError::missing_env_var("VECTORIZER_API_SECRET"))?;

        let api_base_url = var("API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout = match var("TIMEOUT") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_id,
            api_secret,
            api_base_url,
            timeout,
        })
    }

    /// Full URL for an API path such as `/vectorize`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        ConfigError::invalid_value("VECTORIZER_TIMEOUT", format!("'{raw}' is not a number"))
    })?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid_value(
            "VECTORIZER_TIMEOUT",
            "must be greater than 0",
        ));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::invalid_value(
            "VECTORIZER_TIMEOUT",
            format!("must be less than or equal to {MAX_TIMEOUT_SECS}"),
        ));
    }

    Ok(Duration::from_secs_f64(secs))
}

static SETTINGS: OnceLock<Arc<Config>> = OnceLock::new();

/// Process-wide configuration, loaded from the environment on first use.
///
/// A failed load is not cached, so a later call retries after the
/// environment has been fixed. Once loaded, every caller shares the same
/// instance.
pub fn settings() -> Result<Arc<Config>, ConfigError> {
    if let Some(config) = SETTINGS.get() {
        return Ok(Arc::clone(config));
    }

    let config = Arc::new(Config::from_env()?);
    Ok(Arc::clone(SETTINGS.get_or_init(|| config)))
}
