//! Azure OpenAI configuration

use serde::{Deserialize, Serialize};

use certvec_core::Result;
use certvec_core::config::{env_or_default, env_required, trim_endpoint};

/// Configuration for the Azure OpenAI client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_type: String,
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub embeddings_deployment: String,
    pub completions_deployment: String,
    pub dimensions: usize,
}

impl OpenAiConfig {
    pub const DEFAULT_API_VERSION: &'static str = "2023-05-15";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let dimensions = env_or_default("openai_embeddings_dimensions", "1536")
            .parse()
            .map_err(|_| {
                certvec_core::Error::Configuration(
                    "openai_embeddings_dimensions must be a positive integer".to_string(),
                )
            })?;

        Ok(Self {
            api_type: env_or_default("openai_api_type", "azure"),
            api_key: env_required("openai_api_key")?,
            endpoint: trim_endpoint(&env_required("openai_api_endpoint")?),
            api_version: env_or_default("openai_api_version", Self::DEFAULT_API_VERSION),
            embeddings_deployment: env_required("openai_embeddings_deployment")?,
            completions_deployment: env_required("openai_completions_deployment")?,
            dimensions,
        })
    }

    /// Create configuration with explicit values and defaults for the rest
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_type: "azure".to_string(),
            api_key,
            endpoint: trim_endpoint(&endpoint),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            embeddings_deployment: "text-embedding-ada-002".to_string(),
            completions_deployment: "gpt-35-turbo".to_string(),
            dimensions: certvec_core::profile::EMBEDDING_DIMENSIONS,
        }
    }

    /// Header carrying the credential. `azure` keys go in `api-key`; any
    /// other api type (e.g. `azure_ad`) sends the key as a bearer token.
    pub fn auth_header(&self) -> (&'static str, String) {
        if self.api_type.eq_ignore_ascii_case("azure") {
            ("api-key", self.api_key.clone())
        } else {
            ("Authorization", format!("Bearer {}", self.api_key))
        }
    }

    pub fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.embeddings_deployment, self.api_version
        )
    }

    pub fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.completions_deployment, self.api_version
        )
    }
}
