//! # edgequake-docclass
//!
//! Name the type of an uploaded document (invoice, contract, bank statement,
//! CV, …) with a language model.
//!
//! ## Why this crate?
//!
//! Classifying a document needs its text, and the text hides in a different
//! container for every format. This crate turns PDF, DOCX, TXT, CSV, XLSX,
//! XLS and scanned images into plain text, fits that text into the model's
//! context window, asks the model for a short label, and prices the call
//! from the token usage the provider reports.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes + filename
//!  │
//!  ├─ 1. Dispatch  extension → adapter (unknown extensions rejected up front)
//!  ├─ 2. Extract   pdfium / zip+xml / calamine / csv / tesseract (spawn_blocking)
//!  ├─ 3. Budget    tiktoken: truncate so prompt + document fit the context
//!  ├─ 4. Model     one chat call, temperature 0.2, ≤150 tokens, bounded timeout
//!  ├─ 5. Price     integer microdollars from reported usage
//!  └─ 6. Result    { label, cost_microdollars, elapsed_seconds }
//! ```
//!
//! Every failure comes back as a [`ClassificationFailure`] that still carries
//! the elapsed time and a zero cost.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docclass::{ClassifierConfig, DocumentClassifier, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let classifier = DocumentClassifier::new(ClassifierConfig::default())?;
//!     let bytes = std::fs::read("statement.pdf")?;
//!     let result = classifier.classify(UploadedDocument::new("statement.pdf", bytes)).await?;
//!     println!("{}", result.label);
//!     eprintln!("cost: {} µ$ in {:.2}s", result.cost_microdollars, result.elapsed_seconds);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `docclass` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | `POST /classify_file` HTTP service on axum |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-docclass = { version = "0.1", default-features = false }
//! ```
//!
//! ## Native tools
//!
//! PDF text needs a pdfium shared library (`PDFIUM_LIB_PATH`, the working
//! directory, or the system path). Images need the `tesseract` executable.
//! Every other format is pure Rust.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod tokenizer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::DocumentClassifier;
pub use config::{
    ClassifierConfig, ClassifierConfigBuilder, OcrConfig, Pricing, TokenBudget, DEFAULT_MODEL,
};
pub use error::{
    ClassificationFailure, ClassifyError, ExtractionError, InputError, ModelInvocationError,
};
pub use extract::{allowed_file, ExtractorRegistry, FileFormat, TextExtractor};
pub use output::{ClassificationResult, UploadedDocument, UsageReport};
pub use pipeline::budget::{BudgetedPrompt, PromptBudgeter};
pub use pipeline::cost::cost_microdollars;
pub use pipeline::input::resolve_input;
pub use pipeline::llm::{Completion, CompletionBackend, CompletionRequest, ProviderBackend};
pub use prompts::{ChatMessage, Role};
pub use tokenizer::TokenizerAdapter;
