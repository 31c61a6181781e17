//! The language-model capability: submit chat messages, get a completion and
//! its token usage back.
//!
//! [`CompletionBackend`] is the only seam between the classifier and a model.
//! Production code uses [`ProviderBackend`], which adapts any
//! `edgequake_llm` provider; tests plug in a scripted backend. Every call is
//! bounded by a timeout and never retried here: a failure of any kind becomes
//! one [`ModelInvocationError`] and ends the request.

use crate::config::ClassifierConfig;
use crate::error::{ClassifyError, ModelInvocationError};
use crate::output::UsageReport;
use crate::prompts::{ChatMessage, Role};
use async_trait::async_trait;
use edgequake_llm::{CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Completion text with the usage the provider reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: UsageReport,
}

/// Something that can answer a chat prompt.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Model the backend is bound to, when it cannot serve any other.
    ///
    /// The classifier adopts this model so the tokenizer that budgets the
    /// prompt matches the model that reads it.
    fn model(&self) -> Option<&str> {
        None
    }

    async fn complete(&self, request: &CompletionRequest)
        -> Result<Completion, ModelInvocationError>;
}

/// [`CompletionBackend`] over an `edgequake_llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    timeout: Duration,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            label: label.into(),
            timeout,
        }
    }
}

impl fmt::Debug for ProviderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBackend")
            .field("label", &self.label)
            .field("model", &self.provider.model())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn to_provider_message(message: &ChatMessage) -> edgequake_llm::ChatMessage {
    match message.role {
        Role::System => edgequake_llm::ChatMessage::system(message.content.as_str()),
        Role::User => edgequake_llm::ChatMessage::user(message.content.as_str()),
    }
}

fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn model(&self) -> Option<&str> {
        Some(self.provider.model())
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<Completion, ModelInvocationError> {
        let bound = self.provider.model();
        if request.model != bound {
            return Err(ModelInvocationError::new(format!(
                "{} is bound to model '{}' but the request names '{}'",
                self.label, bound, request.model
            )));
        }

        let messages: Vec<_> = request.messages.iter().map(to_provider_message).collect();
        let options = build_options(request);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| {
                ModelInvocationError::new(format!(
                    "{} did not answer within {}s",
                    self.label,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ModelInvocationError::new(format!("{}: {e}", self.label)))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        Ok(Completion {
            text: response.content,
            usage: UsageReport {
                input_tokens: response.prompt_tokens as u64,
                output_tokens: response.completion_tokens as u64,
            },
        })
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ClassifyError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ClassifyError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Build the production backend for `config`.
///
/// Resolution order, most specific first:
///
/// 1. `config.provider`: a provider the caller built.
/// 2. `config.provider_name` with `config.model`.
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI with `config.model`, when `OPENAI_API_KEY` is set.
/// 5. `ProviderFactory::from_env()` auto-detection.
pub fn resolve_backend(config: &ClassifierConfig) -> Result<ProviderBackend, ClassifyError> {
    let timeout = Duration::from_secs(config.api_timeout_secs);
    let (provider, label) = resolve_provider(config)?;
    info!("Using LLM provider: {}", label);
    Ok(ProviderBackend::new(provider, label, timeout))
}

fn resolve_provider(config: &ClassifierConfig) -> Result<(Arc<dyn LLMProvider>, String), ClassifyError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), "custom".to_string()));
    }

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, &config.model)?, name.clone()));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return Ok((create_provider(&prov, &model)?, prov));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return Ok((create_provider("openai", &config.model)?, "openai".to_string()));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ClassifyError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}
