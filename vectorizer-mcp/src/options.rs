//! Closed option sets accepted by `vectorize_image`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Pdf,
    Eps,
    Dxf,
    Png,
}

impl OutputFormat {
    /// Every supported format.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Svg,
        OutputFormat::Pdf,
        OutputFormat::Eps,
        OutputFormat::Dxf,
        OutputFormat::Png,
    ];

    /// Wire value sent as `output.file_format`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Eps => "eps",
            OutputFormat::Dxf => "dxf",
            OutputFormat::Png => "png",
        }
    }

    /// MIME type of files in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Eps => "application/postscript",
            OutputFormat::Dxf => "image/vnd.dxf",
            OutputFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing and quality tier of a vectorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Full quality, 1 credit per image.
    #[default]
    Production,
    /// Watermarked preview, 0.2 credits.
    Preview,
    /// Watermarked test output, free.
    Test,
}

impl ProcessingMode {
    /// Every processing mode.
    pub const ALL: [ProcessingMode; 3] = [
        ProcessingMode::Production,
        ProcessingMode::Preview,
        ProcessingMode::Test,
    ];

    /// Wire value sent as `mode`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Production => "production",
            ProcessingMode::Preview => "preview",
            ProcessingMode::Test => "test",
        }
    }

    /// Credits charged per image.
    pub fn credit_cost(&self) -> f64 {
        match self {
            ProcessingMode::Production => 1.0,
            ProcessingMode::Preview => 0.2,
            ProcessingMode::Test => 0.0,
        }
    }

    /// Whether output in this mode carries a watermark.
    pub fn watermarked(&self) -> bool {
        !matches!(self, ProcessingMode::Production)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Curve primitives allowed in the vector output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CurveStyle {
    All,
    BeziersOnly,
    LinesOnly,
    ArcsAndLines,
}

impl CurveStyle {
    /// Every curve style.
    pub const ALL: [CurveStyle; 4] = [
        CurveStyle::All,
        CurveStyle::BeziersOnly,
        CurveStyle::LinesOnly,
        CurveStyle::ArcsAndLines,
    ];

    /// Wire value sent as `output.curves`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveStyle::All => "all",
            CurveStyle::BeziersOnly => "beziers_only",
            CurveStyle::LinesOnly => "lines_only",
            CurveStyle::ArcsAndLines => "arcs_and_lines",
        }
    }
}

impl fmt::Display for CurveStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
