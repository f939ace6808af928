//! MCP Resources for the Vectorizer server.
//!
//! This module provides resource implementations for:
//! - `vectorizer://formats` - Output formats, processing modes and curve styles
//! - `vectorizer://pricing` - Credit cost per processing mode

use crate::options::{CurveStyle, OutputFormat, ProcessingMode};
use serde::Serialize;

/// URI of the formats resource.
pub const FORMATS_URI: &str = "vectorizer://formats";

/// URI of the pricing resource.
pub const PRICING_URI: &str = "vectorizer://pricing";

/// Information about a supported output format.
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    /// Format identifier, as accepted by `output_format`
    pub id: &'static str,
    /// MIME type of the produced file
    pub mime_type: &'static str,
}

/// Pricing of a processing mode.
#[derive(Debug, Clone, Serialize)]
pub struct ModeInfo {
    /// Mode identifier, as accepted by `mode`
    pub id: &'static str,
    /// Credits charged per image
    pub credits_per_image: f64,
    /// Whether the output is watermarked
    pub watermarked: bool,
}

/// Everything the `vectorize_image` tool accepts as closed option values.
#[derive(Debug, Clone, Serialize)]
pub struct FormatsCatalog {
    pub output_formats: Vec<FormatInfo>,
    pub modes: Vec<&'static str>,
    pub curves: Vec<&'static str>,
}

/// List all supported output formats.
pub fn list_output_formats() -> Vec<FormatInfo> {
    OutputFormat::ALL
        .iter()
        .map(|f| FormatInfo {
            id: f.as_str(),
            mime_type: f.mime_type(),
        })
        .collect()
}

/// List processing modes with their pricing.
pub fn list_modes() -> Vec<ModeInfo> {
    ProcessingMode::ALL
        .iter()
        .map(|m| ModeInfo {
            id: m.as_str(),
            credits_per_image: m.credit_cost(),
            watermarked: m.watermarked(),
        })
        .collect()
}

/// Build the formats catalog.
pub fn formats_catalog() -> FormatsCatalog {
    FormatsCatalog {
        output_formats: list_output_formats(),
        modes: ProcessingMode::ALL.iter().map(|m| m.as_str()).collect(),
        curves: CurveStyle::ALL.iter().map(|c| c.as_str()).collect(),
    }
}

/// Get formats resource as JSON string.
pub fn formats_resource_json() -> String {
    serde_json::to_string_pretty(&formats_catalog()).unwrap_or_else(|_| "{}".to_string())
}

/// Get pricing resource as JSON string.
pub fn pricing_resource_json() -> String {
    serde_json::to_string_pretty(&list_modes()).unwrap_or_else(|_| "[]".to_string())
}

/// Resource body for `uri`, or `None` if no such resource exists.
pub fn read(uri: &str) -> Option<String> {
    match uri {
        FORMATS_URI => Some(formats_resource_json()),
        PRICING_URI => Some(pricing_resource_json()),
        _ => None,
    }
}
