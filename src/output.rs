//! Values handed back to the caller.

use serde::{Deserialize, Serialize};

/// An uploaded file: raw bytes plus the name its format is taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Token usage reported by the provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Outcome of a successful classification.
///
/// Serialises with the field names of the `/classify_file` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Document type name as returned by the model, surrounding whitespace trimmed.
    #[serde(rename = "file_class")]
    pub label: String,
    #[serde(rename = "cost_in_microdollars")]
    pub cost_microdollars: u64,
    /// Wall-clock time of the whole classification.
    #[serde(rename = "time_in_seconds")]
    pub elapsed_seconds: f64,
}
