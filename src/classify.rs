//! Classification entry points.
//!
//! A [`DocumentClassifier`] owns everything that is read-only across requests
//! (config, tokenizer tables, extractor registry, model backend), so one
//! instance can be shared behind an `Arc` and called concurrently. Each call
//! owns its bytes and messages; nothing is locked.

use crate::config::ClassifierConfig;
use crate::error::{ClassificationFailure, ClassifyError, ExtractionError};
use crate::extract::{ExtractorRegistry, FileFormat, TextExtractor};
use crate::output::{ClassificationResult, UploadedDocument, UsageReport};
use crate::pipeline::budget::{BudgetedPrompt, PromptBudgeter};
use crate::pipeline::cost::cost_microdollars;
use crate::pipeline::llm::{resolve_backend, CompletionBackend, CompletionRequest};
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PREFIX};
use crate::tokenizer::TokenizerAdapter;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Names the type of uploaded documents with a language model.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docclass::{ClassifierConfig, DocumentClassifier, UploadedDocument};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
///     let classifier = DocumentClassifier::new(ClassifierConfig::default())?;
///     let doc = UploadedDocument::new("invoice.txt", std::fs::read("invoice.txt")?);
///     let result = classifier.classify(doc).await?;
///     println!("{} ({} µ$, {:.2}s)", result.label, result.cost_microdollars, result.elapsed_seconds);
///     Ok(())
/// }
/// ```
pub struct DocumentClassifier {
    config: ClassifierConfig,
    backend: Arc<dyn CompletionBackend>,
    tokenizer: TokenizerAdapter,
    extractors: ExtractorRegistry,
}

impl DocumentClassifier {
    /// Build a classifier whose backend is resolved from `config` and the
    /// environment.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let backend = resolve_backend(&config)?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Build a classifier around an explicit model backend.
    ///
    /// A backend bound to one model overrides `config.model`, so requests
    /// and the tokenizer both follow the model that actually answers.
    pub fn with_backend(
        mut config: ClassifierConfig,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self, ClassifyError> {
        if let Some(bound) = backend.model() {
            if bound != config.model {
                info!(
                    "{} serves model '{}', not '{}'; using '{}'",
                    backend.name(),
                    bound,
                    config.model,
                    bound
                );
                config.model = bound.to_string();
            }
        }
        let tokenizer = TokenizerAdapter::for_model(&config.model)?;
        let extractors = ExtractorRegistry::new(&config.ocr);
        Ok(Self {
            config,
            backend,
            tokenizer,
            extractors,
        })
    }

    /// Replace the adapter used for `format`.
    pub fn with_extractor(mut self, format: FileFormat, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.register(format, extractor);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &TokenizerAdapter {
        &self.tokenizer
    }

    fn system_prompt(&self) -> &str {
        self.config.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    fn user_prefix(&self) -> &str {
        self.config.user_prefix.as_deref().unwrap_or(DEFAULT_USER_PREFIX)
    }

    /// Extract the text of `document`.
    ///
    /// The format comes from the filename and is checked before any adapter
    /// runs. The adapter itself runs on tokio's blocking pool. Text that is
    /// empty or whitespace-only is [`ClassifyError::EmptyContent`].
    pub async fn extract_text(&self, document: UploadedDocument) -> Result<String, ClassifyError> {
        let format = FileFormat::from_filename(&document.filename).ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                filename: document.filename.clone(),
            }
        })?;

        let registry = self.extractors.clone();
        let bytes = document.bytes;
        let text = tokio::task::spawn_blocking(move || registry.extract(format, &bytes))
            .await
            .map_err(|e| ExtractionError::Interrupted(e.to_string()))??;

        debug!("Extracted {} chars from {} document", text.chars().count(), format);

        if text.trim().is_empty() {
            return Err(ClassifyError::EmptyContent);
        }
        Ok(text)
    }

    /// Bound `text` to the input budget and frame it as `[system, user]`.
    pub fn build_prompt(&self, text: &str) -> Result<BudgetedPrompt, ClassifyError> {
        PromptBudgeter::new(
            &self.tokenizer,
            self.config.budget,
            self.system_prompt(),
            self.user_prefix(),
        )
        .build(text)
    }

    /// Classify one document.
    ///
    /// On failure the error carries the time spent and a zero cost.
    pub async fn classify(
        &self,
        document: UploadedDocument,
    ) -> Result<ClassificationResult, ClassificationFailure> {
        let start = Instant::now();
        let filename = document.filename.clone();
        info!("Classifying '{}' ({} bytes)", filename, document.bytes.len());

        match self.run(document).await {
            Ok((label, cost)) => {
                let elapsed_seconds = start.elapsed().as_secs_f64();
                info!(
                    "'{}' classified as '{}' ({} µ$, {:.2}s)",
                    filename, label, cost, elapsed_seconds
                );
                Ok(ClassificationResult {
                    label,
                    cost_microdollars: cost,
                    elapsed_seconds,
                })
            }
            Err(error) => {
                let elapsed_seconds = start.elapsed().as_secs_f64();
                warn!("'{}' not classified after {:.2}s: {}", filename, elapsed_seconds, error);
                Err(ClassificationFailure::new(error, elapsed_seconds))
            }
        }
    }

    async fn run(&self, document: UploadedDocument) -> Result<(String, u64), ClassifyError> {
        let text = self.extract_text(document).await?;
        let prompt = self.build_prompt(&text)?;

        let estimated_input = self.tokenizer.count_message_tokens(&prompt.messages) as u64;
        debug!(
            "Prompt: {} estimated input tokens, {}/{} document tokens kept",
            estimated_input, prompt.kept_tokens, prompt.document_tokens
        );

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: prompt.messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_response_tokens,
        };
        let completion = self.backend.complete(&request).await?;

        let usage = if completion.usage.input_tokens == 0 {
            warn!(
                "{} reported no input tokens; pricing with local estimate of {}",
                self.backend.name(),
                estimated_input
            );
            UsageReport {
                input_tokens: estimated_input,
                output_tokens: completion.usage.output_tokens,
            }
        } else {
            completion.usage
        };

        let cost = cost_microdollars(&usage, &self.config.pricing);
        Ok((completion.text.trim().to_string(), cost))
    }

    /// Blocking wrapper around [`classify`](Self::classify).
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn classify_sync(
        &self,
        document: UploadedDocument,
    ) -> Result<ClassificationResult, ClassificationFailure> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ClassificationFailure::new(ClassifyError::Runtime(e.to_string()), 0.0))?
            .block_on(self.classify(document))
    }
}

impl fmt::Debug for DocumentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentClassifier")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .field("tokenizer", &self.tokenizer)
            .field("extractors", &self.extractors)
            .finish()
    }
}
