//! Error types for the Vectorizer MCP server.
//!
//! A single `thiserror` hierarchy covers every failure a tool call can hit, so
//! the tool layer can render each kind into its own user-facing message.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or out-of-range `VECTORIZER_*` settings
//! - `Error::InvalidImageSource`: Input is not a URL, file, or base64 payload
//! - `Error::RemoteFetch`: Fetching an image URL failed
//! - `Error::InvalidPath`: Destination parent directory does not exist
//! - `Error::RequestFailed` / `Error::Unauthorized`: Vectorizer.AI rejected a call
//! - `Error::Timeout` / `Error::Connect` / `Error::Http`: Transport-level failures
//! - `Error::UnknownTool`: Dispatch to a tool name that is not registered

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unified error type for the Vectorizer MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing env vars, invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The image input could not be interpreted as a URL, file, or base64 data.
    ///
    /// Only a bounded prefix of the input is kept so large payloads never
    /// end up in error text.
    #[error("Could not load image: '{prefix}...' is not a valid file path, URL, or base64 string")]
    InvalidImageSource {
        /// Leading characters of the rejected input
        prefix: String,
    },

    /// Downloading an image URL failed (non-success status, timeout, or
    /// connection failure)
    #[error("Failed to fetch image from {url}: {reason}")]
    RemoteFetch {
        /// The URL that was fetched
        url: String,
        /// What went wrong, e.g. `HTTP 404`
        reason: String,
    },

    /// The parent directory of an output path does not exist
    #[error("Parent directory does not exist: {}", .0.display())]
    InvalidPath(PathBuf),

    /// The Vectorizer.AI API answered with a non-success status
    #[error("Request failed (HTTP {status_code}): {message}")]
    RequestFailed {
        /// HTTP status code returned by the API
        status_code: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The API rejected the configured credentials (HTTP 401)
    #[error("Invalid API credentials. Check VECTORIZER_API_ID and VECTORIZER_API_SECRET.")]
    Unauthorized,

    /// The request did not complete within its timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(f64),

    /// No connection could be established to the remote host
    #[error("Could not connect to {0}")]
    Connect(String),

    /// Any other HTTP client failure (body read, request building)
    #[error("HTTP error: {0}")]
    Http(String),

    /// A tool name that the server does not expose
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Base64 payload could not be decoded
    #[error("Invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid image source error, keeping at most `max_chars`
    /// characters of the offending input.
    ///
    /// # Example
    ///
    /// ```
    /// use vectorizer_mcp_common::error::Error;
    ///
    /// let err = Error::invalid_image_source(&"x".repeat(200), 50);
    /// let msg = err.to_string();
    /// assert!(msg.contains(&"x".repeat(50)));
    /// assert!(!msg.contains(&"x".repeat(51)));
    /// ```
    pub fn invalid_image_source(input: &str, max_chars: usize) -> Self {
        Error::InvalidImageSource {
            prefix: input.chars().take(max_chars).collect(),
        }
    }

    /// Create a new remote fetch error.
    pub fn remote_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::RemoteFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new request failed error.
    pub fn request_failed(status_code: u16, message: impl Into<String>) -> Self {
        Error::RequestFailed {
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use vectorizer_mcp_common::error::Error;
    ///
    /// let err = Error::validation("max_colors must be between 0 and 256");
    /// assert!(err.to_string().contains("max_colors"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Classify a `reqwest` failure into the timeout / connect / generic kinds.
    ///
    /// `timeout` is the budget the request was sent with, reported back in the
    /// timeout message.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout.as_secs_f64())
        } else if err.is_connect() {
            let target = err
                .url()
                .and_then(|url| url.host_str().map(str::to_string))
                .unwrap_or_else(|| "remote host".to_string());
            Error::Connect(target)
        } else {
            Error::Http(err.to_string())
        }
    }

    /// HTTP status code attached to this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status_code, .. } => Some(*status_code),
            Error::Unauthorized => Some(401),
            _ => None,
        }
    }
}

/// Configuration errors.
///
/// Raised while reading `VECTORIZER_*` settings. Without valid credentials no
/// remote tool can work, so these are the one error kind the tool layer lets
/// escape as a protocol error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new missing environment variable error.
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        ConfigError::MissingEnvVar(name.into())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
