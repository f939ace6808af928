//! Image source resolution.
//!
//! A tool caller hands over one opaque string. It is tried, in order, as an
//! HTTP(S) URL, an existing local file, and finally base64 data (optionally a
//! `data:` URI). The first interpretation that applies wins.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};
use vectorizer_mcp_common::error::Error;

/// Timeout for downloading an image URL. Kept well below the vectorization
/// timeout.
pub const URL_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of input characters echoed back in an invalid-source error.
pub const DEFAULT_ECHO_CHARS: usize = 50;

/// How an image input string will be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// An `http://` or `https://` URL to download.
    Url(&'a str),
    /// A path to an existing regular file.
    File(&'a Path),
    /// Anything else; decoded as base64.
    Inline(&'a str),
}

impl<'a> ImageSource<'a> {
    /// Classify `input`. Checks the filesystem for the file case.
    pub async fn classify(input: &'a str) -> ImageSource<'a> {
        if is_http_url(input) {
            return ImageSource::Url(input);
        }

        let path = Path::new(input);
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if is_file {
            return ImageSource::File(path);
        }

        ImageSource::Inline(input)
    }
}

fn is_http_url(input: &str) -> bool {
    let lower = input
        .get(..8)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| input.to_ascii_lowercase());
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Turns image input strings into raw bytes.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    fetch_timeout: Duration,
    echo_chars: usize,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self {
            fetch_timeout: URL_FETCH_TIMEOUT,
            echo_chars: DEFAULT_ECHO_CHARS,
        }
    }
}

impl ImageResolver {
    /// Create a resolver with the default fetch timeout and echo length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the URL download timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override how many input characters an error message may echo.
    pub fn with_echo_chars(mut self, echo_chars: usize) -> Self {
        self.echo_chars = echo_chars;
        self
    }

    /// Resolve `input` to image bytes.
    ///
    /// # Errors
    /// - `Error::RemoteFetch` if a URL cannot be downloaded
    /// - `Error::Io` if an existing file cannot be read
    /// - `Error::InvalidImageSource` if the input is none of the above
    #[instrument(level = "debug", name = "resolve_image", skip_all, fields(input_len = input.len()))]
    pub async fn resolve(&self, input: &str) -> Result<Vec<u8>, Error> {
        if input.trim().is_empty() {
            return Err(Error::invalid_image_source(input, self.echo_chars));
        }

        match ImageSource::classify(input).await {
            ImageSource::Url(url) => self.fetch(url).await,
            ImageSource::File(path) => {
                debug!(path = %path.display(), "Reading image from local file");
                Ok(tokio::fs::read(path).await?)
            }
            ImageSource::Inline(data) => {
                debug!("Decoding inline base64 image");
                decode_inline(data).ok_or_else(|| Error::invalid_image_source(input, self.echo_chars))
            }
        }
    }

    /// Download a URL with a client scoped to this call.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!(url = %url, "Fetching image from URL");

        let client = reqwest::Client::builder()
            .timeout(self.fetch_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::remote_fetch(url, self.fetch_failure_reason(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote_fetch(url, format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::remote_fetch(url, self.fetch_failure_reason(&e)))?;
        Ok(bytes.to_vec())
    }

    fn fetch_failure_reason(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {} seconds", self.fetch_timeout.as_secs_f64())
        } else if err.is_connect() {
            "could not connect".to_string()
        } else {
            err.to_string()
        }
    }
}

/// Decode standard base64, ignoring ASCII whitespace such as line breaks in
/// wrapped payloads.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64.decode(compact.as_bytes())
}

/// Decode base64 image data, accepting a `data:...;base64,` prefix.
fn decode_inline(data: &str) -> Option<Vec<u8>> {
    let payload = match data.trim_start().strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => data,
    };

    match decode_base64(payload) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_resolves_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");
        std::fs::write(&path, b"fake png content").unwrap();

        let bytes = ImageResolver::new()
            .resolve(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, b"fake png content");
    }

    #[tokio::test]
    async fn test_resolves_base64() {
        let encoded = BASE64.encode(b"test image data");
        let bytes = ImageResolver::new().resolve(&encoded).await.unwrap();
        assert_eq!(bytes, b"test image data");
    }

    #[tokio::test]
    async fn test_resolves_data_uri_with_line_breaks() {
        let encoded = BASE64.encode(vec![7u8; 120]);
        let (head, tail) = encoded.split_at(40);
        let input = format!("data:image/png;base64,{}\n{}", head, tail);

        let bytes = ImageResolver::new().resolve(&input).await.unwrap();
        assert_eq!(bytes, vec![7u8; 120]);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let err = ImageResolver::new()
            .resolve("~~~not~valid~base64~~~")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidImageSource { .. }));
        assert!(err.to_string().contains("Could not load image"));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let err = ImageResolver::new().resolve("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidImageSource { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_falls_through_to_base64() {
        // Not an existing file and not valid base64 (contains '/' and '.').
        let err = ImageResolver::new()
            .resolve("/definitely/not/here.png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidImageSource { .. }));
    }

    #[tokio::test]
    async fn test_file_wins_over_base64() {
        // "abcd" is valid base64, but an existing file of that name takes priority.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abcd");
        std::fs::write(&path, b"file bytes").unwrap();

        let source = ImageSource::classify(path.to_str().unwrap()).await;
        assert_eq!(source, ImageSource::File(path.as_path()));
    }

    #[tokio::test]
    async fn test_echo_length_is_configurable() {
        let input = "!".repeat(100);
        let err = ImageResolver::new()
            .with_echo_chars(10)
            .resolve(&input)
            .await
            .unwrap_err();
        match err {
            Error::InvalidImageSource { prefix } => assert_eq!(prefix, "!".repeat(10)),
            other => panic!("expected InvalidImageSource, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_base64_ignores_line_breaks() {
        assert_eq!(decode_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64(" aGVs\r\n bG8=\n").unwrap(), b"hello");
        assert!(decode_base64("aGVs*bG8=").is_err());
    }

    #[test]
    fn test_url_detection() {
        assert!(is_http_url("https://example.com/a.png"));
        assert!(is_http_url("http://example.com/a.png"));
        assert!(is_http_url("HTTPS://EXAMPLE.COM/A.PNG"));
        assert!(!is_http_url("ftp://example.com/a.png"));
        assert!(!is_http_url("/tmp/https://odd"));
        assert!(!is_http_url("http"));
    }

    #[tokio::test]
    async fn test_resolves_url() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/image.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote image content".to_vec()))
            .mount(&mock_server)
            .await;

        let url = format!("{}/image.png", mock_server.uri());
        let bytes = ImageResolver::new().resolve(&url).await.unwrap();
        assert_eq!(bytes, b"remote image content");
    }

    #[tokio::test]
    async fn test_url_non_success_is_remote_fetch_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing.png", mock_server.uri());
        let err = ImageResolver::new().resolve(&url).await.unwrap_err();
        match err {
            Error::RemoteFetch { url: failed, reason } => {
                assert_eq!(failed, url);
                assert_eq!(reason, "HTTP 404");
            }
            other => panic!("expected RemoteFetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_url_fetch_timeout_is_remote_fetch_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let err = ImageResolver::new()
            .with_fetch_timeout(Duration::from_millis(200))
            .resolve(&format!("{}/slow.png", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "got {}", err);
    }

    #[tokio::test]
    async fn test_url_classification_precedes_file_check() {
        let source = ImageSource::classify("https://example.com/image.png").await;
        assert_eq!(source, ImageSource::Url("https://example.com/image.png"));
    }

    proptest! {
        /// Any byte payload survives encode → resolve unchanged.
        #[test]
        fn base64_input_resolves_to_decoded_bytes(data in prop::collection::vec(any::<u8>(), 1..512)) {
            let encoded = BASE64.encode(&data);
            let rt = tokio::runtime::Runtime::new().unwrap();
            let resolved = rt.block_on(ImageResolver::new().resolve(&encoded)).unwrap();
            prop_assert_eq!(&resolved, &data);
            prop_assert_eq!(BASE64.encode(&resolved), encoded);
        }

        /// Rejected input never echoes more than 50 characters.
        #[test]
        fn invalid_input_echo_is_bounded(input in "[!@#$%^&*()~]{1,300}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let err = rt.block_on(ImageResolver::new().resolve(&input)).unwrap_err();
            match err {
                Error::InvalidImageSource { prefix } => {
                    prop_assert!(prefix.chars().count() <= DEFAULT_ECHO_CHARS);
                    prop_assert!(input.starts_with(&prefix));
                }
                other => prop_assert!(false, "expected InvalidImageSource, got {:?}", other),
            }
        }
    }
}
