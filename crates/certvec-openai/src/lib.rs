//! Azure OpenAI integration for certvec
//!
//! This crate provides the Azure OpenAI implementation of the
//! `EmbeddingProvider` and `ChatProvider` traits.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use certvec_core::{ChatMessage, ChatProvider, EmbeddingProvider, Error, Result};
