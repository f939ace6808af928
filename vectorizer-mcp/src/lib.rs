//! Vectorizer MCP Server Library
//!
//! This library exposes the Vectorizer.AI bitmap-to-vector API as MCP tools:
//! image source resolution, the HTTP client, tool handlers and the
//! `ServerHandler` implementation.

pub mod client;
pub mod handler;
pub mod options;
pub mod resources;
pub mod server;
pub mod source;

pub use client::{AccountStatus, VectorizeOptions, VectorizeOutput, VectorizeRequest, VectorizerClient};
pub use handler::{OutputLimits, SaveFileParams, VectorizeParams, VectorizeResult, VectorizerHandler, VectorOutput};
pub use options::{CurveStyle, OutputFormat, ProcessingMode};
pub use server::VectorizerServer;
pub use source::{ImageResolver, ImageSource};
