use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslateResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Interface for a stateless completion model
/// The whole conversation is sent with every call; nothing is remembered
#[async_trait]
pub trait CompletionInterface: Send + Sync {
    /// Send one completion request and return the assistant's text
    async fn complete(&self, messages: Vec<ChatMessage>) -> TranslateResult<String>;
}
