//! HTTP client for the Vectorizer.AI API.
//!
//! One `VectorizerClient` is built per tool call and dropped when the call
//! finishes, along with its connection pool. Every request uses HTTP Basic
//! auth and the configured timeout; nothing is retried.

use crate::options::{CurveStyle, OutputFormat, ProcessingMode};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use vectorizer_mcp_common::config::{ApiSecret, Config};
use vectorizer_mcp_common::error::Error;

/// Response header carrying the number of credits a call consumed.
pub const CREDITS_CHARGED_HEADER: &str = "X-Credits-Charged";

/// Placeholder shown when the credits header is absent.
pub const CREDITS_UNKNOWN: &str = "N/A";

/// Maximum characters of a non-JSON error body kept in error messages.
pub const ERROR_BODY_CHARS: usize = 200;

/// Optional processing settings forwarded to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorizeOptions {
    /// Limit on output colors (0 = unlimited).
    pub max_colors: Option<u16>,
    /// Curve primitives the output may use.
    pub curves: Option<CurveStyle>,
    /// Palette remap specification.
    pub palette: Option<String>,
}

impl VectorizeOptions {
    /// Remote form fields for every option that is set. Unset options are
    /// left out entirely rather than sent empty.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(max_colors) = self.max_colors {
            fields.push(("processing.max_colors", max_colors.to_string()));
        }
        if let Some(curves) = self.curves {
            fields.push(("output.curves", curves.as_str().to_string()));
        }
        if let Some(palette) = &self.palette {
            fields.push(("processing.palette", palette.clone()));
        }
        fields
    }
}

/// A single vectorization call.
#[derive(Debug, Clone)]
pub struct VectorizeRequest {
    /// Raw bitmap bytes.
    pub image: Vec<u8>,
    /// Requested output format.
    pub output_format: OutputFormat,
    /// Billing/quality tier.
    pub mode: ProcessingMode,
    /// Extra processing settings.
    pub options: VectorizeOptions,
}

impl VectorizeRequest {
    /// All text fields of the multipart body, in send order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("output.file_format", self.output_format.as_str().to_string()),
            ("mode", self.mode.as_str().to_string()),
        ];
        fields.extend(self.options.form_fields());
        fields
    }
}

/// Successful vectorization response.
#[derive(Debug, Clone)]
pub struct VectorizeOutput {
    /// Raw output file bytes.
    pub data: Vec<u8>,
    /// Value of the credits-charged header, if present.
    pub credits_charged: Option<String>,
}

impl VectorizeOutput {
    /// Credits charged, or `N/A` when the API did not say.
    pub fn credits_display(&self) -> &str {
        self.credits_charged.as_deref().unwrap_or(CREDITS_UNKNOWN)
    }
}

/// Account status returned by `GET /account`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    /// Remaining credits.
    #[serde(default)]
    pub credits: f64,
    /// Subscription plan name.
    #[serde(default)]
    pub subscription_plan: Option<String>,
    /// Subscription state (e.g. "active").
    #[serde(default)]
    pub subscription_status: Option<String>,
}

/// Authenticated Vectorizer.AI client.
pub struct VectorizerClient {
    http: reqwest::Client,
    vectorize_url: String,
    account_url: String,
    api_id: String,
    api_secret: ApiSecret,
    timeout: Duration,
}

impl VectorizerClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `Error::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            vectorize_url: config.endpoint("vectorize"),
            account_url: config.endpoint("account"),
            api_id: config.api_id.clone(),
            api_secret: config.api_secret.clone(),
            timeout: config.timeout,
        })
    }

    /// Vectorize an image.
    ///
    /// # Errors
    /// - `Error::RequestFailed` for non-2xx responses
    /// - `Error::Timeout` / `Error::Connect` / `Error::Http` for transport failures
    #[instrument(level = "info", name = "vectorize", skip_all, fields(format = %request.output_format, mode = %request.mode, image_bytes = request.image.len()))]
    pub async fn vectorize(&self, request: VectorizeRequest) -> Result<VectorizeOutput, Error> {
        let endpoint = &self.vectorize_url;

        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        form = form.part("image", Part::bytes(request.image).file_name("image"));

        debug!(endpoint = %endpoint, "Calling Vectorizer.AI");

        let response = self
            .http
            .post(endpoint)
            .basic_auth(&self.api_id, Some(self.api_secret.expose()))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        let response = check_status(response).await?;

        let credits_charged = response
            .headers()
            .get(CREDITS_CHARGED_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?
            .to_vec();

        info!(bytes = data.len(), credits = ?credits_charged, "Vectorization complete");
        Ok(VectorizeOutput {
            data,
            credits_charged,
        })
    }

    /// Fetch account status and remaining credits.
    ///
    /// # Errors
    /// - `Error::Unauthorized` when the credentials are rejected (HTTP 401)
    /// - `Error::RequestFailed` for any other non-2xx response
    /// - `Error::Timeout` / `Error::Connect` / `Error::Http` for transport failures
    #[instrument(level = "info", name = "account", skip_all)]
    pub async fn account(&self) -> Result<AccountStatus, Error> {
        let endpoint = &self.account_url;
        debug!(endpoint = %endpoint, "Fetching account status");

        let response = self
            .http
            .get(endpoint)
            .basic_auth(&self.api_id, Some(self.api_secret.expose()))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        let response = match check_status(response).await {
            Err(Error::RequestFailed {
                status_code: 401, ..
            }) => return Err(Error::Unauthorized),
            other => other?,
        };

        response
            .json::<AccountStatus>()
            .await
            .map_err(|e| Error::Http(format!("Failed to parse account response: {}", e)))
    }
}

/// Pass through 2xx responses; turn anything else into `Error::RequestFailed`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::request_failed(status.as_u16(), error_detail(&body)))
}

/// Best-effort error message from an API error body.
///
/// Prefers a top-level `message`, then `error.message`, then the JSON text
/// itself; non-JSON bodies are cut to [`ERROR_BODY_CHARS`] characters.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let message = json
                .get("message")
                .or_else(|| json.get("error").and_then(|e| e.get("message")));
            match message {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => json.to_string(),
            }
        }
        Err(_) => body.chars().take(ERROR_BODY_CHARS).collect(),
    }
}
