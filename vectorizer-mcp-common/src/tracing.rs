//! Tracing initialization for the Vectorizer MCP server.
//!
//! Log output always goes to **stderr**: with the stdio transport, stdout
//! carries the MCP JSON-RPC stream and any stray line there corrupts it.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=vectorizer_mcp=debug` - Enable debug for the server crate
//!   - `RUST_LOG=warn,vectorizer_mcp_common=debug` - Warn by default, debug for common
//!
//! # Usage
//!
//! ```no_run
//! use vectorizer_mcp_common::tracing::init_tracing;
//!
//! init_tracing();
//! tracing::info!("Server starting");
//! ```

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn try_init_with(default_level: &str) -> Result<(), TryInitError> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt_layer)
        .try_init()
}

/// Initialize the global subscriber, filtering via `RUST_LOG` (default `info`).
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_LOG_LEVEL);
}

/// Initialize tracing with a custom default level used when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing_with_default(default_level: &str) {
    if let Err(e) = try_init_with(default_level) {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Try to initialize tracing, returning an error if already initialized.
///
/// Useful in tests, where several cases may race to install the subscriber.
pub fn try_init_tracing() -> Result<(), TryInitError> {
    try_init_with(DEFAULT_LOG_LEVEL)
}
