//! Embedding and chat provider traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Trait for hosted embedding models
///
/// One call turns one piece of text into one fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this provider returns
    fn dimensions(&self) -> usize;
}

/// Trait for hosted chat completion models
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate the assistant reply to a conversation
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
