//! Tool handlers for the Vectorizer MCP server.
//!
//! This module provides the `VectorizerHandler` struct and parameter types for
//! the `vectorize_image`, `save_file` and `check_account` tools, plus the
//! text rendering of their results and failures.

use crate::client::{AccountStatus, VectorizeOptions, VectorizeRequest, VectorizerClient};
use crate::options::{CurveStyle, OutputFormat, ProcessingMode};
use crate::source::{DEFAULT_ECHO_CHARS, ImageResolver, decode_base64};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use vectorizer_mcp_common::config::Config;
use vectorizer_mcp_common::error::Error;

/// Upper bound for `max_colors`.
pub const MAX_COLORS: u16 = 256;

/// Default number of base64 characters shown in an inline result preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Cutoffs applied to text that ends up in tool results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    /// Base64 characters shown before the preview is cut with `...`.
    pub preview_chars: usize,
    /// Input characters echoed back when an image source is rejected.
    pub echo_chars: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
            echo_chars: DEFAULT_ECHO_CHARS,
        }
    }
}

/// Vectorization parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct VectorizeParams {
    /// Image source: local file path, URL, or base64-encoded data.
    pub image: String,

    /// Output format. Defaults to svg.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Processing mode. Defaults to production.
    #[serde(default)]
    pub mode: ProcessingMode,

    /// Save the output directly to this path instead of returning base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Limit output colors (0 = unlimited, 1-256).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_colors: Option<u16>,

    /// Curve types to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curves: Option<CurveStyle>,

    /// Color palette mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
}

/// Validation error details for tool parameters.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl VectorizeParams {
    /// Validate the parameters.
    ///
    /// # Returns
    /// - `Ok(())` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with all validation errors
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.image.trim().is_empty() {
            errors.push(ValidationError {
                field: "image".to_string(),
                message: "Image cannot be empty".to_string(),
            });
        }

        if let Some(max_colors) = self.max_colors {
            if max_colors > MAX_COLORS {
                errors.push(ValidationError {
                    field: "max_colors".to_string(),
                    message: format!(
                        "max_colors must be between 0 and {}, got {}",
                        MAX_COLORS, max_colors
                    ),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Processing options to forward to the API.
    pub fn options(&self) -> VectorizeOptions {
        VectorizeOptions {
            max_colors: self.max_colors,
            curves: self.curves,
            palette: self.palette.clone(),
        }
    }
}

/// Parameters for `save_file`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SaveFileParams {
    /// Base64-encoded file content.
    pub content_base64: String,
    /// Destination file path (e.g., /path/to/output.svg).
    pub path: String,
}

/// Vectorization handler.
///
/// Owns the API client for a single tool call. Dropping the handler releases
/// the client and its connections.
pub struct VectorizerHandler {
    client: VectorizerClient,
    resolver: ImageResolver,
    limits: OutputLimits,
}

impl VectorizerHandler {
    /// Create a handler from configuration.
    ///
    /// # Errors
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn new(config: &Config, limits: OutputLimits) -> Result<Self, Error> {
        Ok(Self {
            client: VectorizerClient::new(config)?,
            resolver: ImageResolver::new().with_echo_chars(limits.echo_chars),
            limits,
        })
    }

    /// Output limits this handler renders with.
    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    /// Vectorize an image.
    ///
    /// When `output_path` is set its parent directory is checked before the
    /// API is called, so a bad path never costs credits.
    #[instrument(level = "info", name = "vectorize_image", skip(self, params), fields(format = %params.output_format, mode = %params.mode))]
    pub async fn vectorize(&self, params: VectorizeParams) -> Result<VectorizeResult, Error> {
        params.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::validation(messages.join("; "))
        })?;

        let output_path = params.output_path.as_deref().map(PathBuf::from);
        if let Some(path) = &output_path {
            ensure_parent_exists(path).await?;
        }

        let image = self.resolver.resolve(&params.image).await?;
        debug!(image_bytes = image.len(), "Image resolved");

        let request = VectorizeRequest {
            image,
            output_format: params.output_format,
            mode: params.mode,
            options: params.options(),
        };
        let response = self.client.vectorize(request).await?;
        let credits_charged = response.credits_display().to_string();
        let size_bytes = response.data.len();

        let output = match output_path {
            Some(path) => {
                ensure_parent_exists(&path).await?;
                tokio::fs::write(&path, &response.data).await?;
                info!(path = %path.display(), size_bytes, "Saved vectorized output");
                VectorOutput::LocalFile(path)
            }
            None => VectorOutput::Base64(BASE64.encode(&response.data)),
        };

        Ok(VectorizeResult {
            output_format: params.output_format,
            mode: params.mode,
            credits_charged,
            size_bytes,
            output,
        })
    }

    /// Fetch account status and remaining credits.
    #[instrument(level = "info", name = "check_account", skip(self))]
    pub async fn check_account(&self) -> Result<AccountStatus, Error> {
        self.client.account().await
    }
}

/// Decode base64 content and write it to `params.path`.
///
/// The parent directory must already exist; nothing is written otherwise.
/// Needs no credentials.
#[instrument(level = "info", name = "save_file", skip(params), fields(path = %params.path))]
pub async fn save_file(params: &SaveFileParams) -> Result<SavedFile, Error> {
    let path = PathBuf::from(&params.path);
    ensure_parent_exists(&path).await?;

    let content = decode_base64(&params.content_base64)?;
    tokio::fs::write(&path, &content).await?;

    let size_bytes = tokio::fs::metadata(&path).await?.len();
    info!(size_bytes, "Saved file");
    Ok(SavedFile { path, size_bytes })
}

/// Fail with `Error::InvalidPath` unless the parent of `path` is an existing
/// directory. A bare file name refers to the working directory.
async fn ensure_parent_exists(path: &Path) -> Result<(), Error> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    let is_dir = tokio::fs::metadata(parent)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if is_dir {
        Ok(())
    } else {
        Err(Error::InvalidPath(parent.to_path_buf()))
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Where the vectorized output went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorOutput {
    /// Written to a local file (when output_path specified)
    LocalFile(PathBuf),
    /// Full base64 encoding of the output (when no output_path specified)
    Base64(String),
}

/// Result of a vectorization.
#[derive(Debug, Clone)]
pub struct VectorizeResult {
    pub output_format: OutputFormat,
    pub mode: ProcessingMode,
    /// Credits reported by the API, or `N/A`.
    pub credits_charged: String,
    /// Size of the vector output in bytes.
    pub size_bytes: usize,
    pub output: VectorOutput,
}

impl VectorizeResult {
    /// Render the result for the agent. Inline base64 is cut to
    /// `preview_chars` characters; the value held in `output` stays whole.
    pub fn render(&self, preview_chars: usize) -> String {
        let format = self.output_format.as_str().to_uppercase();
        let size = format_kb(self.size_bytes as u64);

        match &self.output {
            VectorOutput::LocalFile(path) => format!(
                "Image vectorized successfully!\n\n\
                 **Output:** {}\n\
                 **Format:** {}\n\
                 **Size:** {}\n\
                 **Mode:** {}\n\
                 **Credits charged:** {}",
                path.display(),
                format,
                size,
                self.mode,
                self.credits_charged
            ),
            VectorOutput::Base64(content) => format!(
                "Image vectorized successfully!\n\n\
                 **Format:** {}\n\
                 **Size:** {}\n\
                 **Mode:** {}\n\
                 **Credits charged:** {}\n\n\
                 **Content (base64):**\n```\n{}\n```\n\n\
                 Use `save_file` tool to save this content, or provide `output_path` parameter.",
                format,
                size,
                self.mode,
                self.credits_charged,
                preview(content, preview_chars)
            ),
        }
    }
}

/// Result of `save_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SavedFile {
    /// Render the result for the agent.
    pub fn render(&self) -> String {
        format!(
            "File saved successfully!\n\n**Path:** {}\n**Size:** {}",
            self.path.display(),
            format_kb(self.size_bytes)
        )
    }
}

/// Render account status with the static pricing reference.
pub fn render_account(status: &AccountStatus) -> String {
    format!(
        "**Vectorizer.AI Account Status**\n\n\
         Credits: {}\n\
         Plan: {}\n\
         Status: {}\n\n\
         Pricing reference:\n\
         - Production: 1 credit per image\n\
         - Preview: 0.2 credits (watermarked)\n\
         - Test: Free (watermarked)",
        status.credits,
        status.subscription_plan.as_deref().unwrap_or("Unknown"),
        status.subscription_status.as_deref().unwrap_or("Unknown"),
    )
}

fn format_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

// =============================================================================
// Error Rendering
// =============================================================================

const CONNECT_FAILED: &str = "Error: Could not connect to Vectorizer.AI API.";

/// Text shown to the agent when `vectorize_image` fails.
pub fn describe_vectorize_error(err: &Error) -> String {
    match err {
        Error::RequestFailed {
            status_code,
            message,
        } => format!("Vectorization failed (HTTP {}): {}", status_code, message),
        Error::Timeout(_) => "Error: Vectorization timed out. Try a smaller image.".to_string(),
        Error::Connect(_) => CONNECT_FAILED.to_string(),
        Error::Validation(message) => format!("Invalid parameters: {}", message),
        Error::InvalidImageSource { .. } | Error::RemoteFetch { .. } => err.to_string(),
        other => format!("Error: {}", other),
    }
}

/// Text shown to the agent when `check_account` fails.
pub fn describe_account_error(err: &Error) -> String {
    match err {
        Error::Unauthorized => format!("Error: {}", err),
        Error::RequestFailed { status_code, .. } => {
            format!("Error checking account: HTTP {}", status_code)
        }
        Error::Timeout(_) => "Error: Request timed out. Check your network connection.".to_string(),
        Error::Connect(_) => CONNECT_FAILED.to_string(),
        other => format!("Error checking account: {}", other),
    }
}

/// Text shown to the agent when `save_file` fails.
pub fn describe_save_error(err: &Error) -> String {
    match err {
        Error::InvalidPath(_) => format!("Error: {}", err),
        other => format!("Error saving file: {}", other),
    }
}
