//! Configuration types for document classification.
//!
//! All classification behaviour is controlled through [`ClassifierConfig`],
//! built via its [`ClassifierConfigBuilder`]. The defaults reproduce the
//! production service: `gpt-3.5-turbo`, a 4 096-token context with 200 tokens
//! reserved, temperature 0.2, at most 150 response tokens, and
//! $0.0005 / $0.0015 per thousand input / output tokens.

use crate::error::ClassifyError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for a [`crate::DocumentClassifier`].
///
/// # Example
/// ```rust
/// use edgequake_docclass::ClassifierConfig;
///
/// let config = ClassifierConfig::builder()
///     .model("gpt-4o-mini")
///     .max_context_tokens(8192)
///     .build()
///     .unwrap();
/// assert_eq!(config.budget.max_input_tokens(), 8192 - 200);
/// ```
#[derive(Clone)]
pub struct ClassifierConfig {
    /// LLM model identifier. Also selects the tokenizer. Default: `gpt-3.5-turbo`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Context window and the share of it kept back for framing and the answer.
    pub budget: TokenBudget,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low enough that the same document gets the same label across calls.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 150.
    ///
    /// A document type name is a handful of tokens; the cap bounds the cost of
    /// a model that ignores the "name only" instruction.
    pub max_response_tokens: usize,

    /// Per-thousand-token rates used to price a call.
    pub pricing: Pricing,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom text placed before the document in the user message.
    /// If None, uses [`crate::prompts::DEFAULT_USER_PREFIX`].
    pub user_prefix: Option<String>,

    /// OCR engine settings for PNG/JPEG uploads.
    pub ocr: OcrConfig,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            budget: TokenBudget::default(),
            temperature: 0.2,
            max_response_tokens: 150,
            pricing: Pricing::default(),
            system_prompt: None,
            user_prefix: None,
            ocr: OcrConfig::default(),
            api_timeout_secs: 60,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("budget", &self.budget)
            .field("temperature", &self.temperature)
            .field("max_response_tokens", &self.max_response_tokens)
            .field("pricing", &self.pricing)
            .field("ocr", &self.ocr)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ClassifierConfig {
    /// Create a new builder for `ClassifierConfig`.
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClassifierConfig`].
#[derive(Debug)]
pub struct ClassifierConfigBuilder {
    config: ClassifierConfig,
}

impl ClassifierConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_context_tokens(mut self, n: usize) -> Self {
        self.config.budget.max_context_tokens = n;
        self
    }

    pub fn reserved_tokens(mut self, n: usize) -> Self {
        self.config.budget.reserved_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_response_tokens(mut self, n: usize) -> Self {
        self.config.max_response_tokens = n;
        self
    }

    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.config.pricing = pricing;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.user_prefix = Some(prefix.into());
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.ocr.tesseract_cmd = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = lang.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A budget whose reserve swallows the whole context window is accepted
    /// here; it surfaces as [`ClassifyError::DocumentTooLong`] per document.
    pub fn build(self) -> Result<ClassifierConfig, ClassifyError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ClassifyError::InvalidConfig("Model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(ClassifyError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_response_tokens == 0 {
            return Err(ClassifyError::InvalidConfig(
                "Max response tokens must be ≥ 1".into(),
            ));
        }
        c.pricing.validate()?;
        if c.api_timeout_secs == 0 {
            return Err(ClassifyError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ClassifyError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Budget ───────────────────────────────────────────────────────────────

/// Context window split between the prompt and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Tokens the model accepts for input and output combined. Default: 4096.
    pub max_context_tokens: usize,
    /// Tokens held back for message framing and the response. Default: 200.
    pub reserved_tokens: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_context_tokens: 4096,
            reserved_tokens: 200,
        }
    }
}

impl TokenBudget {
    pub fn new(max_context_tokens: usize, reserved_tokens: usize) -> Self {
        Self {
            max_context_tokens,
            reserved_tokens,
        }
    }

    /// `max_context_tokens − reserved_tokens`, negative when over-reserved.
    pub fn max_input_tokens(&self) -> i64 {
        self.max_context_tokens as i64 - self.reserved_tokens as i64
    }
}

// ── Pricing ──────────────────────────────────────────────────────────────

/// USD rates per thousand tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_1k_usd: f64,
    pub output_per_1k_usd: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_1k_usd: 0.0005,
            output_per_1k_usd: 0.0015,
        }
    }
}

impl Pricing {
    pub fn new(input_per_1k_usd: f64, output_per_1k_usd: f64) -> Self {
        Self {
            input_per_1k_usd,
            output_per_1k_usd,
        }
    }

    fn validate(&self) -> Result<(), ClassifyError> {
        for (name, rate) in [
            ("input", self.input_per_1k_usd),
            ("output", self.output_per_1k_usd),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ClassifyError::InvalidConfig(format!(
                    "The {name} rate must be a non-negative number, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────

/// How to invoke the tesseract OCR engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Executable name or path. Default: `tesseract` (looked up on `PATH`).
    pub tesseract_cmd: PathBuf,
    /// Tesseract language pack, e.g. `eng`, `deu`, `eng+fra`. Default: `eng`.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_service() {
        let c = ClassifierConfig::default();
        assert_eq!(c.model, "gpt-3.5-turbo");
        assert_eq!(c.budget.max_input_tokens(), 3896);
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.max_response_tokens, 150);
        assert_eq!(c.pricing, Pricing::new(0.0005, 0.0015));
        assert_eq!(c.download_timeout_secs, 120);
    }

    #[test]
    fn builder_sets_and_checks_download_timeout() {
        let c = ClassifierConfig::builder().download_timeout_secs(30).build().unwrap();
        assert_eq!(c.download_timeout_secs, 30);

        let err = ClassifierConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Download timeout"), "got: {err}");
    }

    #[test]
    fn over_reserved_budget_is_negative_not_wrapped() {
        let b = TokenBudget::new(100, 250);
        assert_eq!(b.max_input_tokens(), -150);
    }

    #[test]
    fn builder_rejects_bad_temperature() {
        let err = ClassifierConfig::builder().temperature(3.5).build().unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_negative_rate() {
        let err = ClassifierConfig::builder()
            .pricing(Pricing::new(-0.1, 0.0015))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("input rate"), "got: {err}");
    }

    #[test]
    fn builder_accepts_over_reserved_budget() {
        let c = ClassifierConfig::builder()
            .max_context_tokens(100)
            .reserved_tokens(500)
            .build()
            .expect("over-reservation is a per-document error");
        assert!(c.budget.max_input_tokens() < 0);
    }
}
