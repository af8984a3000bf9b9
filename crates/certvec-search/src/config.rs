//! Azure AI Search configuration

use serde::{Deserialize, Serialize};

use certvec_core::Result;
use certvec_core::config::{env_or_default, env_required, trim_endpoint};

/// Configuration for the search client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl SearchServiceConfig {
    pub const DEFAULT_API_VERSION: &'static str = "2023-11-01";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: trim_endpoint(&env_required("cognitive_search_api_endpoint")?),
            api_key: env_required("cognitive_search_api_key")?,
            api_version: env_or_default("cognitive_search_api_version", Self::DEFAULT_API_VERSION),
        })
    }

    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            endpoint: trim_endpoint(&endpoint),
            api_key,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Full URL of a service path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}?api-version={}", self.endpoint, path, self.api_version)
    }
}
