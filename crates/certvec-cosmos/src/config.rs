//! Cosmos DB configuration

use serde::{Deserialize, Serialize};

use certvec_core::Result;
use certvec_core::config::{env_required, trim_endpoint};

/// Configuration for the Cosmos DB client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://acct.documents.azure.com:443`
    pub endpoint: String,
    /// Base64 master key
    pub key: String,
    /// Account connection string, handed to the search indexer's data
    /// source; ends with `;`
    pub connection_string: String,
}

impl CosmosConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            env_required("cosmos_db_api_endpoint")?,
            env_required("cosmos_db_api_key")?,
            env_required("cosmos_db_connection_string")?,
        ))
    }

    pub fn new(endpoint: String, key: String, connection_string: String) -> Self {
        let mut connection_string = connection_string.trim().to_string();
        if !connection_string.ends_with(';') {
            connection_string.push(';');
        }
        Self {
            endpoint: trim_endpoint(&endpoint),
            key,
            connection_string,
        }
    }
}
