//! Azure OpenAI client implementation

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use certvec_core::{ChatMessage, ChatProvider, EmbeddingProvider, Error, Result};

use crate::config::OpenAiConfig;

/// Azure OpenAI client
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response> {
        let (auth_name, auth_value) = self.config.auth_header();
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header(auth_name, auth_value)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication(format!(
                "Azure OpenAI rejected the api key: {}",
                response.status()
            )));
        }

        Ok(response)
    }

    async fn failure_text(response: Response) -> String {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("request failed with status {}: {}", status, error_text)
    }

    /// Extract the first embedding of a response body
    pub(crate) fn parse_embedding(body: &str) -> Result<Vec<f32>> {
        let parsed: EmbeddingResponse = serde_json::from_str(body)?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("response contained no embedding".to_string()))
    }

    /// Extract the first choice's message of a response body
    pub(crate) fn parse_completion(body: &str) -> Result<String> {
        let parsed: ChatResponse = serde_json::from_str(body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| Error::Completion("response contained no message".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .post(&self.config.embeddings_url(), &EmbeddingRequest { input: text })
            .await?;

        if !response.status().is_success() {
            return Err(Error::Embedding(Self::failure_text(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Self::parse_embedding(&body)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(messages = messages.len(), deployment = %self.config.completions_deployment, "requesting completion");
        let response = self
            .post(&self.config.chat_url(), &ChatRequest { messages })
            .await?;

        if !response.status().is_success() {
            return Err(Error::Completion(Self::failure_text(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Self::parse_completion(&body)
    }
}
