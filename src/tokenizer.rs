//! Model-keyed BPE tokenizer with a fixed fallback encoding.
//!
//! The encoding is resolved in two explicit steps: the model identifier is
//! looked up in tiktoken's model table, and when that finds nothing the
//! [`DEFAULT_ENCODING`] (`cl100k_base`) is used instead. An unknown model is
//! therefore never an error, only a `warn!`.
//!
//! ## Message accounting
//!
//! ```text
//! tokens = PRIMING_TOKENS
//!        + Σ over messages ( TOKENS_PER_MESSAGE + |role| + |content| )
//! ```
//!
//! The constants follow the chat-format overhead published for the
//! gpt-3.5/gpt-4 family and are stable for the life of the crate version.

use crate::error::ClassifyError;
use crate::prompts::ChatMessage;
use std::fmt;
use std::sync::Arc;
use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Encoding used when the model is not in tiktoken's table.
pub const DEFAULT_ENCODING: Tokenizer = Tokenizer::Cl100kBase;

/// Framing overhead charged for every message.
pub const TOKENS_PER_MESSAGE: usize = 4;

/// Charged once per prompt for the assistant reply priming.
pub const PRIMING_TOKENS: usize = 2;

/// Which encoding a model maps to, and whether it came from the fallback.
#[derive(Debug, Clone, Copy)]
pub struct EncodingChoice {
    pub encoding: Tokenizer,
    pub is_fallback: bool,
}

/// Exact lookup first, then [`DEFAULT_ENCODING`].
pub fn resolve_encoding(model: &str) -> EncodingChoice {
    match get_tokenizer(model) {
        Some(encoding) => EncodingChoice {
            encoding,
            is_fallback: false,
        },
        None => EncodingChoice {
            encoding: DEFAULT_ENCODING,
            is_fallback: true,
        },
    }
}

/// Encode / decode / count for one model.
///
/// Cloning is cheap; the BPE tables are shared.
#[derive(Clone)]
pub struct TokenizerAdapter {
    bpe: Arc<CoreBPE>,
    choice: EncodingChoice,
}

impl TokenizerAdapter {
    /// Load the encoding for `model`, falling back to `cl100k_base`.
    ///
    /// Fails only if the BPE tables themselves cannot be built.
    pub fn for_model(model: &str) -> Result<Self, ClassifyError> {
        let choice = resolve_encoding(model);
        if choice.is_fallback {
            warn!(
                "No tokenizer registered for model '{}', using {:?}",
                model, choice.encoding
            );
        } else {
            debug!("Tokenizer for '{}': {:?}", model, choice.encoding);
        }

        let bpe = tiktoken_rs::get_bpe_from_tokenizer(choice.encoding)
            .map_err(|e| ClassifyError::Tokenizer(format!("{:?}: {e}", choice.encoding)))?;

        Ok(Self {
            bpe: Arc::new(bpe),
            choice,
        })
    }

    pub fn encoding(&self) -> Tokenizer {
        self.choice.encoding
    }

    /// `true` when the model was unknown and the default encoding is in use.
    pub fn is_fallback(&self) -> bool {
        self.choice.is_fallback
    }

    /// Token ids of `text`. Special-token strings inside the text are encoded
    /// as ordinary text.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Decode a full token sequence back to text.
    pub fn decode(&self, tokens: &[u32]) -> Result<String, ClassifyError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| ClassifyError::Tokenizer(e.to_string()))
    }

    /// Decode at most the first `max_tokens` tokens.
    ///
    /// A cut can land inside a multi-byte character; the prefix is then
    /// shortened one token at a time until it decodes. Returns the text and the
    /// number of tokens it was decoded from.
    pub fn decode_prefix(&self, tokens: &[u32], max_tokens: usize) -> (String, usize) {
        let mut keep = max_tokens.min(tokens.len());
        while keep > 0 {
            match self.bpe.decode(tokens[..keep].to_vec()) {
                Ok(text) => return (text, keep),
                Err(_) => keep -= 1,
            }
        }
        (String::new(), 0)
    }

    /// Tokens a chat prompt costs, framing included.
    pub fn count_message_tokens(&self, messages: &[ChatMessage]) -> usize {
        let body: usize = messages
            .iter()
            .map(|m| TOKENS_PER_MESSAGE + self.count(m.role.as_str()) + self.count(&m.content))
            .sum();
        body + PRIMING_TOKENS
    }
}

impl fmt::Debug for TokenizerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerAdapter")
            .field("encoding", &self.choice.encoding)
            .field("is_fallback", &self.choice.is_fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cl100k() -> TokenizerAdapter {
        TokenizerAdapter::for_model("gpt-3.5-turbo").unwrap()
    }

    #[test]
    fn known_model_resolves_exactly() {
        let choice = resolve_encoding("gpt-3.5-turbo");
        assert!(!choice.is_fallback);
        assert!(matches!(choice.encoding, Tokenizer::Cl100kBase));

        let choice = resolve_encoding("gpt-4o");
        assert!(!choice.is_fallback);
        assert!(matches!(choice.encoding, Tokenizer::O200kBase));
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let choice = resolve_encoding("my-local-llama");
        assert!(choice.is_fallback);
        assert!(matches!(choice.encoding, Tokenizer::Cl100kBase));

        let tok = TokenizerAdapter::for_model("my-local-llama").unwrap();
        assert!(tok.is_fallback());
        assert_eq!(tok.count("hello world"), 2);
    }

    #[test]
    fn decode_inverts_encode() {
        let tok = cl100k();
        let text = "Invoice #2024-17\nTotal due: 1 250,00 €";
        assert_eq!(tok.decode(&tok.encode(text)).unwrap(), text);
    }

    #[test]
    fn prefix_longer_than_input_is_identity() {
        let tok = cl100k();
        let text = "Dear Sir or Madam, please find attached.";
        let ids = tok.encode(text);
        let (out, kept) = tok.decode_prefix(&ids, ids.len() + 10);
        assert_eq!(out, text);
        assert_eq!(kept, ids.len());
    }

    #[test]
    fn prefix_never_exceeds_limit() {
        let tok = cl100k();
        let ids = tok.encode(&"lorem ipsum dolor sit amet ".repeat(50));
        let (out, kept) = tok.decode_prefix(&ids, 17);
        assert!(kept <= 17);
        assert!(tok.count(&out) <= 17);
        assert_eq!(tok.decode_prefix(&ids, 0), (String::new(), 0));
    }

    #[test]
    fn prefix_backs_off_inside_multibyte_characters() {
        let tok = cl100k();
        let text = "漢字漢字漢字";
        let ids = tok.encode(text);
        for limit in 0..=ids.len() {
            let (out, kept) = tok.decode_prefix(&ids, limit);
            assert!(kept <= limit);
            assert!(text.starts_with(&out), "limit {limit}: {out:?}");
        }
    }

    #[test]
    fn message_count_includes_framing() {
        let tok = cl100k();
        let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")];
        let expected = PRIMING_TOKENS
            + 2 * TOKENS_PER_MESSAGE
            + tok.count("system")
            + tok.count("Be brief.")
            + tok.count("user")
            + tok.count("Hi");
        assert_eq!(tok.count_message_tokens(&messages), expected);
        assert_eq!(tok.count_message_tokens(&[]), PRIMING_TOKENS);
    }
}
