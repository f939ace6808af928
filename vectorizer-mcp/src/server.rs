//! MCP Server implementation for the Vectorizer server.
//!
//! This module provides the MCP server handler that exposes:
//! - `vectorize_image` tool for bitmap-to-vector conversion
//! - `save_file` tool for writing base64 content to disk
//! - `check_account` tool for credit and subscription status
//! - Resources for supported formats and pricing

use crate::handler::{
    OutputLimits, SaveFileParams, VectorizeParams, VectorizerHandler, describe_account_error,
    describe_save_error, describe_vectorize_error, render_account, save_file,
};
use crate::options::{CurveStyle, OutputFormat, ProcessingMode};
use crate::resources;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, JsonObject, ListResourcesResult, ReadResourceResult, Resource,
        ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vectorizer_mcp_common::config::{self, Config};
use vectorizer_mcp_common::error::Error;

/// Tool names exposed by the server.
pub const VECTORIZE_IMAGE: &str = "vectorize_image";
pub const SAVE_FILE: &str = "save_file";
pub const CHECK_ACCOUNT: &str = "check_account";

/// Where the server gets its configuration from.
#[derive(Clone)]
enum ConfigSource {
    /// The process-wide lazy singleton.
    Global,
    /// A fixed configuration, used by tests and embedders.
    Fixed(Arc<Config>),
}

impl ConfigSource {
    fn load(&self) -> Result<Arc<Config>, Error> {
        match self {
            ConfigSource::Global => Ok(config::settings()?),
            ConfigSource::Fixed(config) => Ok(Arc::clone(config)),
        }
    }
}

/// Map a configuration failure to the MCP error returned for the call.
fn config_unavailable(err: Error) -> McpError {
    warn!(error = %err, "Configuration unavailable");
    McpError::internal_error(format!("Configuration error: {}", err), None)
}

/// MCP Server for Vectorizer.AI.
///
/// Holds no per-call state; every tool call builds and drops its own handler.
#[derive(Clone)]
pub struct VectorizerServer {
    config: ConfigSource,
    limits: OutputLimits,
}

/// Tool parameters wrapper for vectorize_image.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct VectorizeImageToolParams {
    /// Image source: local file path, URL, or base64-encoded data
    pub image: String,
    /// Output format (default: svg)
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
    /// Processing mode: production (1 credit, full quality), preview (0.2 credits, watermarked), test (free, watermarked)
    #[serde(default)]
    pub mode: Option<ProcessingMode>,
    /// Optional: Save output directly to this path. If not provided, returns base64 content.
    #[serde(default)]
    pub output_path: Option<String>,
    /// Limit output colors (0=unlimited, 1-256)
    #[serde(default)]
    #[schemars(range(min = 0, max = 256))]
    pub max_colors: Option<u16>,
    /// Curve types to use
    #[serde(default)]
    pub curves: Option<CurveStyle>,
    /// Color palette mapping. Format: '[color][-> remapped][~ tolerance];'
    /// Use #RRGGBB for opaque, #RRGGBBAA for transparent.
    /// Example to make dark background transparent: '#0d1117 -> #00000000;'
    /// Fully transparent colors (#RRGGBB00) are omitted from result.
    #[serde(default)]
    pub palette: Option<String>,
}

impl From<VectorizeImageToolParams> for VectorizeParams {
    fn from(params: VectorizeImageToolParams) -> Self {
        Self {
            image: params.image,
            output_format: params.output_format.unwrap_or_default(),
            mode: params.mode.unwrap_or_default(),
            output_path: params.output_path,
            max_colors: params.max_colors,
            curves: params.curves,
            palette: params.palette,
        }
    }
}

/// Tool parameters wrapper for save_file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveFileToolParams {
    /// Base64-encoded file content
    pub content_base64: String,
    /// Destination file path (e.g., /path/to/output.svg)
    pub path: String,
}

impl From<SaveFileToolParams> for SaveFileParams {
    fn from(params: SaveFileToolParams) -> Self {
        Self {
            content_base64: params.content_base64,
            path: params.path,
        }
    }
}

/// Tool parameters for check_account (takes none).
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CheckAccountToolParams {}

impl VectorizerServer {
    /// Create a server that reads configuration from the environment on
    /// first use.
    pub fn new(limits: OutputLimits) -> Self {
        Self {
            config: ConfigSource::Global,
            limits,
        }
    }

    /// Create a server bound to an explicit configuration.
    pub fn with_config(config: Arc<Config>, limits: OutputLimits) -> Self {
        Self {
            config: ConfigSource::Fixed(config),
            limits,
        }
    }

    /// Output limits used when rendering results.
    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    fn load_config(&self) -> Result<Arc<Config>, McpError> {
        self.config.load().map_err(config_unavailable)
    }

    /// Route a tool call by name.
    ///
    /// Tool failures come back as error-flagged text results. Only a missing
    /// or invalid configuration is returned as a protocol error.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        match name {
            VECTORIZE_IMAGE => match parse_arguments::<VectorizeImageToolParams>(arguments) {
                Ok(params) => self.vectorize_image(params.into()).await,
                Err(message) => Ok(error_result(message)),
            },
            SAVE_FILE => match parse_arguments::<SaveFileToolParams>(arguments) {
                Ok(params) => Ok(self.save_file(params.into()).await),
                Err(message) => Ok(error_result(message)),
            },
            CHECK_ACCOUNT => match parse_arguments::<CheckAccountToolParams>(arguments) {
                Ok(_) => self.check_account().await,
                Err(message) => Ok(error_result(message)),
            },
            _ => {
                warn!(tool = %name, "Unknown tool requested");
                Ok(error_result(Error::UnknownTool(name.to_string()).to_string()))
            }
        }
    }

    /// Vectorize an image.
    pub async fn vectorize_image(&self, params: VectorizeParams) -> Result<CallToolResult, McpError> {
        info!(format = %params.output_format, mode = %params.mode, "Vectorizing image");

        let config = self.load_config()?;
        let handler = match VectorizerHandler::new(&config, self.limits) {
            Ok(handler) => handler,
            Err(e) => return Ok(error_result(describe_vectorize_error(&e))),
        };

        match handler.vectorize(params).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(
                result.render(self.limits.preview_chars),
            )])),
            Err(e) => {
                warn!(error = %e, "Vectorization failed");
                Ok(error_result(describe_vectorize_error(&e)))
            }
        }
    }

    /// Save base64 content to a local file.
    pub async fn save_file(&self, params: SaveFileParams) -> CallToolResult {
        match save_file(&params).await {
            Ok(saved) => CallToolResult::success(vec![Content::text(saved.render())]),
            Err(e) => {
                warn!(error = %e, "Saving file failed");
                error_result(describe_save_error(&e))
            }
        }
    }

    /// Check account status.
    pub async fn check_account(&self) -> Result<CallToolResult, McpError> {
        let config = self.load_config()?;
        let handler = match VectorizerHandler::new(&config, self.limits) {
            Ok(handler) => handler,
            Err(e) => return Ok(error_result(describe_account_error(&e))),
        };

        match handler.check_account().await {
            Ok(status) => Ok(CallToolResult::success(vec![Content::text(render_account(&status))])),
            Err(e) => {
                warn!(error = %e, "Account check failed");
                Ok(error_result(describe_account_error(&e)))
            }
        }
    }
}

fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Deserialize tool arguments. Absent arguments are treated as an empty
/// object so tools without required fields can be called bare.
fn parse_arguments<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T, String> {
    let value = serde_json::Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value).map_err(|e| format!("Invalid parameters: {}", e))
}

fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema).unwrap_or_default() {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn tool(name: &'static str, description: &'static str, input_schema: Arc<JsonObject>) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }
}

/// The three tools this server publishes.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        tool(
            VECTORIZE_IMAGE,
            "Convert a bitmap image (PNG, JPG, WEBP, BMP, GIF) to vector format \
             (SVG, PDF, EPS, DXF). Uses AI-powered vectorization with sub-pixel precision. \
             Modes: production (1 credit), preview (0.2 credits, watermarked), \
             test (free, watermarked). Returns the vectorized content.",
            input_schema::<VectorizeImageToolParams>(),
        ),
        tool(
            SAVE_FILE,
            "Save binary content (from vectorize_image) to a local file. \
             Use when you have base64-encoded vector data to save.",
            input_schema::<SaveFileToolParams>(),
        ),
        tool(
            CHECK_ACCOUNT,
            "Check your Vectorizer.AI account status and remaining credits. \
             Use this to verify your API credentials are configured correctly.",
            input_schema::<CheckAccountToolParams>(),
        ),
    ]
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    Resource {
        raw: rmcp::model::RawResource {
            uri: uri.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some("application/json".to_string()),
            size: None,
            icons: None,
            meta: None,
        },
        annotations: None,
    }
}

/// Resources this server publishes.
pub fn resource_definitions() -> Vec<Resource> {
    vec![
        resource(
            resources::FORMATS_URI,
            "Supported Formats",
            "Output formats, processing modes and curve styles accepted by vectorize_image",
        ),
        resource(
            resources::PRICING_URI,
            "Pricing",
            "Credits charged per image for each processing mode",
        ),
    ]
}

impl ServerHandler for VectorizerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Vectorizer.AI server for converting bitmap images to vector graphics. \
                 Use vectorize_image to convert an image from a path, URL or base64 data, \
                 save_file to write returned base64 content to disk, \
                 and check_account to see remaining credits."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(rmcp::model::ListToolsResult {
                tools: tool_definitions(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(params.name.as_ref(), params.arguments).await }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");
            Ok(ListResourcesResult {
                resources: resource_definitions(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let content = resources::read(uri).ok_or_else(|| {
                McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
            })?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use rmcp::model::RawContent;
    use std::time::Duration;
    use vectorizer_mcp_common::config::ApiSecret;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_server(base_url: String) -> VectorizerServer {
        let config = Config {
            api_id: "test-id".to_string(),
            api_secret: ApiSecret::new("test-secret"),
            api_base_url: base_url,
            timeout: Duration::from_secs(5),
        };
        VectorizerServer::with_config(Arc::new(config), OutputLimits::default())
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_server_info() {
        let server = VectorizerServer::new(OutputLimits::default());
        let info = server.get_info();
        assert!(info.instructions.is_some());
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_tool_params_defaults() {
        let tool_params: VectorizeImageToolParams =
            serde_json::from_value(serde_json::json!({"image": "abcd"})).unwrap();
        let params: VectorizeParams = tool_params.into();
        assert_eq!(params.output_format, OutputFormat::Svg);
        assert_eq!(params.mode, ProcessingMode::Production);
        assert!(params.max_colors.is_none());
    }

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, vec!["vectorize_image", "save_file", "check_account"]);

        let schema = serde_json::Value::Object((*tools[0].input_schema).clone()).to_string();
        assert!(schema.contains("beziers_only"));
        assert!(schema.contains("dxf"));
        assert!(schema.contains("maximum"));

        let required = tools[1].input_schema.get("required").unwrap().to_string();
        assert!(required.contains("content_base64"));
        assert!(required.contains("path"));
    }

    #[test]
    fn test_resource_definitions() {
        let uris: Vec<String> = resource_definitions()
            .into_iter()
            .map(|r| r.raw.uri)
            .collect();
        assert_eq!(uris, vec!["vectorizer://formats", "vectorizer://pricing"]);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = VectorizerServer::new(OutputLimits::default());
        let result = server.dispatch("resize_image", None).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Unknown tool: resize_image");
    }

    #[test]
    fn test_config_failure_is_internal_error() {
        let err = Error::from(vectorizer_mcp_common::error::ConfigError::missing_env_var(
            "VECTORIZER_API_ID",
        ));
        assert!(matches!(err, Error::Config(_)));

        let mcp_err = config_unavailable(err);
        assert_eq!(mcp_err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert_eq!(
            mcp_err.message,
            "Configuration error: Required environment variable VECTORIZER_API_ID is not set"
        );
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let server = test_server("http://127.0.0.1:9".to_string());
        let result = server.dispatch(VECTORIZE_IMAGE, None).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.starts_with("Invalid parameters:"), "got {}", message);
        assert!(message.contains("image"));
    }

    #[tokio::test]
    async fn test_save_file_needs_no_config() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        let server = VectorizerServer::new(OutputLimits::default());

        let result = server
            .dispatch(
                SAVE_FILE,
                args(serde_json::json!({
                    "content_base64": BASE64.encode(b"hello"),
                    "path": target.to_string_lossy(),
                })),
            )
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert!(text(&result).contains("0.0 KB"));
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_vectorize_image_returns_preview() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectorize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Credits-Charged", "0.000")
                    .set_body_bytes(vec![b'v'; 4096]),
            )
            .mount(&mock_server)
            .await;

        let server = test_server(mock_server.uri());
        let result = server
            .dispatch(
                VECTORIZE_IMAGE,
                args(serde_json::json!({
                    "image": BASE64.encode(b"png bytes"),
                    "mode": "test"
                })),
            )
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        let message = text(&result);
        assert!(message.starts_with("Image vectorized successfully!"));
        assert!(message.contains("**Credits charged:** 0.000"));
        assert!(message.contains("..."));
    }

    #[tokio::test]
    async fn test_vectorize_image_api_failure_is_error_text() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectorize"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": {"message": "Image too small"}})),
            )
            .mount(&mock_server)
            .await;

        let server = test_server(mock_server.uri());
        let result = server
            .dispatch(
                VECTORIZE_IMAGE,
                args(serde_json::json!({"image": BASE64.encode(b"png bytes")})),
            )
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Vectorization failed (HTTP 400): Image too small");
    }

    #[tokio::test]
    async fn test_check_account_unauthorized() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let server = test_server(mock_server.uri());
        let result = server.dispatch(CHECK_ACCOUNT, None).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("Invalid API credentials"));
    }
}
