//! Vectorizer MCP Common Library
//!
//! Shared configuration, error types, tracing setup and transport plumbing
//! for the Vectorizer.AI MCP server.

pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use config::{ApiSecret, Config, settings};
pub use error::{ConfigError, Error, Result};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
