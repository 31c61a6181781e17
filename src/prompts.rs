//! Prompt text and the provider-neutral message type.
//!
//! Callers can override both strings via
//! [`crate::config::ClassifierConfig::system_prompt`] and
//! [`crate::config::ClassifierConfig::user_prefix`]; the constants here are
//! used only when no override is provided. Their token lengths count against
//! the document budget, so keep them short.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default system prompt for naming a document's type.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a document classification assistant. \
Given a document's text content, identify what type of document it is. \
Respond with only the name of the document.";

/// Default text placed in front of the document in the user message.
pub const DEFAULT_USER_PREFIX: &str = "What type of document is this?\n\n";

/// Who a [`ChatMessage`] is from. Only the two roles a classification prompt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the prompt. Order matters: the system message comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
