//! Fit the document into the model's input budget.
//!
//! ```text
//! max_doc_tokens = (max_context − reserved) − |system prompt| − |user prefix|
//! ```
//!
//! When `max_doc_tokens <= 0` nothing of the document fits and the request
//! fails with [`ClassifyError::DocumentTooLong`]. Otherwise the document is
//! cut to its first `max_doc_tokens` tokens. The cut is a hard prefix of the
//! token stream with no regard for sentence or page boundaries; whatever
//! follows is dropped.

use crate::config::TokenBudget;
use crate::error::ClassifyError;
use crate::prompts::ChatMessage;
use crate::tokenizer::TokenizerAdapter;
use tracing::{debug, warn};

/// The two-message prompt plus what the cut kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetedPrompt {
    /// Exactly `[system, user]`.
    pub messages: Vec<ChatMessage>,
    pub document_tokens: usize,
    pub kept_tokens: usize,
    pub truncated: bool,
}

/// Builds bounded prompts from fixed system / prefix strings.
#[derive(Debug, Clone)]
pub struct PromptBudgeter<'a> {
    tokenizer: &'a TokenizerAdapter,
    budget: TokenBudget,
    system_prompt: &'a str,
    user_prefix: &'a str,
}

impl<'a> PromptBudgeter<'a> {
    pub fn new(
        tokenizer: &'a TokenizerAdapter,
        budget: TokenBudget,
        system_prompt: &'a str,
        user_prefix: &'a str,
    ) -> Self {
        Self {
            tokenizer,
            budget,
            system_prompt,
            user_prefix,
        }
    }

    /// Tokens the system prompt and user prefix take together.
    pub fn fixed_prompt_tokens(&self) -> usize {
        self.tokenizer.count(self.system_prompt) + self.tokenizer.count(self.user_prefix)
    }

    /// How many document tokens fit; zero or negative means none.
    pub fn max_document_tokens(&self) -> i64 {
        self.budget.max_input_tokens() - self.fixed_prompt_tokens() as i64
    }

    /// Build `[system, user = prefix + document]` within the budget.
    pub fn build(&self, document: &str) -> Result<BudgetedPrompt, ClassifyError> {
        let max_doc = self.max_document_tokens();
        if max_doc <= 0 {
            return Err(ClassifyError::DocumentTooLong {
                max_input_tokens: self.budget.max_input_tokens(),
                fixed_prompt_tokens: self.fixed_prompt_tokens(),
            });
        }
        let max_doc = max_doc as usize;

        let tokens = self.tokenizer.encode(document);
        let (text, kept) = if tokens.len() <= max_doc {
            (document.to_string(), tokens.len())
        } else {
            self.tokenizer.decode_prefix(&tokens, max_doc)
        };
        let truncated = kept < tokens.len();

        if truncated {
            warn!(
                "Document truncated: kept {} of {} tokens (budget {})",
                kept,
                tokens.len(),
                max_doc
            );
        } else {
            debug!("Document fits: {} tokens (budget {})", tokens.len(), max_doc);
        }

        Ok(BudgetedPrompt {
            messages: vec![
                ChatMessage::system(self.system_prompt),
                ChatMessage::user(format!("{}{}", self.user_prefix, text)),
            ],
            document_tokens: tokens.len(),
            kept_tokens: kept,
            truncated,
        })
    }
}
