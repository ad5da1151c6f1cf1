//! Chat-completion capability.
//!
//! Provider-specific request shaping lives outside this workspace; the
//! core only relies on the single-string-response contract below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior exchange in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A language-model provider answering one prompt with one string.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Produce the assistant's reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[ChatTurn],
    ) -> Result<String, ProviderError>;
}
