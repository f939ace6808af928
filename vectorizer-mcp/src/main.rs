//! Vectorizer MCP Server
//!
//! MCP server for bitmap-to-vector conversion using the Vectorizer.AI API.

use anyhow::Result;
use clap::Parser;
use vectorizer_mcp::handler::{DEFAULT_PREVIEW_CHARS, OutputLimits};
use vectorizer_mcp::source::DEFAULT_ECHO_CHARS;
use vectorizer_mcp::VectorizerServer;
use vectorizer_mcp_common::tracing::init_tracing;
use vectorizer_mcp_common::{McpServerBuilder, TransportArgs, settings};

/// Command-line arguments for the vectorizer server.
#[derive(Parser, Debug)]
#[command(name = "vectorizer-mcp")]
#[command(about = "MCP server for bitmap-to-vector conversion using Vectorizer.AI")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,

    /// Base64 characters shown in an inline vectorization result
    #[arg(long, env = "VECTORIZER_PREVIEW_CHARS", default_value_t = DEFAULT_PREVIEW_CHARS)]
    preview_chars: usize,

    /// Input characters echoed back when an image source is rejected
    #[arg(long, env = "VECTORIZER_ECHO_CHARS", default_value_t = DEFAULT_ECHO_CHARS)]
    echo_chars: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("vectorizer-mcp server starting...");

    let args = Args::parse();

    // Credentials are read lazily; a bad environment only fails the tools
    // that need it.
    match settings() {
        Ok(config) => tracing::info!(
            api_base_url = %config.api_base_url,
            timeout_secs = config.timeout.as_secs_f64(),
            "Configuration loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "Configuration incomplete; API tools will fail until it is fixed"),
    }

    let limits = OutputLimits {
        preview_chars: args.preview_chars,
        echo_chars: args.echo_chars,
    };
    let server = VectorizerServer::new(limits);

    let transport = args.transport.into_transport();
    tracing::info!(transport = %transport, "Starting MCP server");

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
