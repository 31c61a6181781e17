//! Error types for the edgequake-docclass library.
//!
//! Failures fall into three groups:
//!
//! * [`ExtractionError`]: the uploaded bytes could not be turned into text
//!   (unknown extension, corrupt container, undecodable image, …). Every
//!   adapter-level failure is translated into one of these variants before it
//!   leaves [`crate::extract`].
//!
//! * [`ClassifyError`]: the taxonomy reported by
//!   [`crate::DocumentClassifier::classify`]: extraction, empty content,
//!   document too long, model invocation. A handful of setup-only variants
//!   (bad config, provider missing, tokenizer unavailable) are returned by
//!   constructors and never by `classify` itself.
//!
//! * [`InputError`]: the CLI could not obtain the document bytes from a path
//!   or URL.
//!
//! At the orchestrator boundary a [`ClassifyError`] is always wrapped in a
//! [`ClassificationFailure`] so the caller can report elapsed time and a zero
//! cost uniformly, whatever went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// A failure to turn an uploaded document into plain text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The filename's extension is not on the allow-list. Raised before any
    /// adapter runs.
    #[error("Unsupported file type: '{filename}'\nAllowed: pdf, png, jpg, jpeg, docx, txt, xlsx, xls, csv")]
    UnsupportedFormat { filename: String },

    #[error("Error reading PDF file: {0}")]
    Pdf(String),

    #[error("Error reading DOCX file: {0}")]
    Docx(String),

    #[error("Error reading TXT file: {0}")]
    Txt(String),

    /// The bytes are not a decodable PNG/JPEG image.
    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    /// The image decoded fine but the OCR engine failed on it.
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Error reading XLSX file: {0}")]
    Xlsx(String),

    #[error("Error reading XLS file: {0}")]
    Xls(String),

    #[error("Error reading CSV file: {0}")]
    Csv(String),

    /// The blocking extraction task panicked or was cancelled.
    #[error("Extraction interrupted: {0}")]
    Interrupted(String),
}

/// The language-model capability failed (transport, auth, rate limit, timeout).
///
/// Never retried inside the library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ModelInvocationError {
    pub message: String,
}

impl ModelInvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors produced while classifying a document.
#[derive(Debug, Error)]
pub enum ClassifyError {
    // ── Classification errors ─────────────────────────────────────────────
    /// The document bytes could not be converted to text.
    #[error("Failed to extract text: {0}")]
    Extraction(#[from] ExtractionError),

    /// Extraction succeeded but produced only whitespace.
    #[error("No extractable text found in the file.")]
    EmptyContent,

    /// Not a single document token fits after reserving prompt and response
    /// space.
    #[error(
        "Document too long to classify after reserving context space \
         (input budget {max_input_tokens} tokens, fixed prompt {fixed_prompt_tokens} tokens)"
    )]
    DocumentTooLong {
        max_input_tokens: i64,
        fixed_prompt_tokens: usize,
    },

    /// The LLM provider call failed.
    #[error("LLM API error: {0}")]
    ModelInvocation(#[from] ModelInvocationError),

    // ── Setup errors ──────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The BPE tables for the requested encoding could not be loaded.
    #[error("Tokenizer unavailable: {0}")]
    Tokenizer(String),

    /// A blocking wrapper could not start its tokio runtime.
    #[error("Failed to create tokio runtime: {0}")]
    Runtime(String),
}

impl ClassifyError {
    /// `true` for failures caused by the document itself rather than by the
    /// provider or the setup.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            ClassifyError::Extraction(_)
                | ClassifyError::EmptyContent
                | ClassifyError::DocumentTooLong { .. }
        )
    }
}

/// A failed classification, paired with the time spent before failing.
///
/// `cost_microdollars` is always zero: no usage is billed to the caller for a
/// request that did not produce a label.
#[derive(Debug, Error)]
#[error("{error} (after {elapsed_seconds:.3}s)")]
pub struct ClassificationFailure {
    #[source]
    pub error: ClassifyError,
    pub elapsed_seconds: f64,
    pub cost_microdollars: u64,
}

impl ClassificationFailure {
    pub fn new(error: ClassifyError, elapsed_seconds: f64) -> Self {
        Self {
            error,
            elapsed_seconds,
            cost_microdollars: 0,
        }
    }
}

/// Failure to load the document bytes for the CLI.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_always_carries_zero_cost() {
        let f = ClassificationFailure::new(ClassifyError::EmptyContent, 0.25);
        assert_eq!(f.cost_microdollars, 0);
        assert!(f.to_string().contains("0.250s"), "got: {f}");
    }

    #[test]
    fn extraction_error_wraps_with_format_message() {
        let e: ClassifyError = ExtractionError::Docx("missing word/document.xml".into()).into();
        let msg = e.to_string();
        assert!(msg.starts_with("Failed to extract text"), "got: {msg}");
        assert!(msg.contains("DOCX"), "got: {msg}");
    }

    #[test]
    fn document_too_long_display() {
        let e = ClassifyError::DocumentTooLong {
            max_input_tokens: -10,
            fixed_prompt_tokens: 42,
        };
        assert!(e.to_string().contains("42 tokens"));
    }

    #[test]
    fn document_errors_are_distinguished_from_provider_errors() {
        assert!(ClassifyError::EmptyContent.is_document_error());
        assert!(ClassifyError::from(ExtractionError::Txt("bad".into())).is_document_error());
        assert!(!ClassifyError::from(ModelInvocationError::new("429")).is_document_error());
    }

    #[test]
    fn unsupported_format_names_the_file() {
        let e = ExtractionError::UnsupportedFormat {
            filename: "report.doc".into(),
        };
        assert!(e.to_string().contains("report.doc"));
    }
}
