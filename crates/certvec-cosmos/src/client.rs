//! Cosmos DB client implementation

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use certvec_core::{DocumentStore, Error, Provisioned, Record, Result, StoreTarget};

use crate::auth::{authorization_token, rfc1123_date};
use crate::config::CosmosConfig;

const API_VERSION: &str = "2018-12-31";

/// Cosmos DB (SQL API) REST client
pub struct CosmosClient {
    config: CosmosConfig,
    client: Client,
}

impl CosmosClient {
    pub fn new(config: CosmosConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CosmosConfig::from_env()?)
    }

    pub fn config(&self) -> &CosmosConfig {
        &self.config
    }

    /// Map a create response status: success is `Created`, 409 Conflict is
    /// `AlreadyExists`, anything else is left to the caller
    pub fn provisioned_from(status: StatusCode) -> Option<Provisioned> {
        if status.is_success() {
            Some(Provisioned::Created)
        } else if status == StatusCode::CONFLICT {
            Some(Provisioned::AlreadyExists)
        } else {
            None
        }
    }

    /// Value of the partition key header for a record: a JSON array with
    /// the field named by the partition key path
    pub fn partition_key_header(record: &Record, path: &str) -> Result<String> {
        let field = path.trim_start_matches('/');
        let value = record.get(field).ok_or_else(|| {
            Error::InvalidInput(format!("record has no partition key field '{}'", field))
        })?;
        Ok(Value::Array(vec![value.clone()]).to_string())
    }

    async fn create(
        &self,
        resource_type: &str,
        resource_link: &str,
        body: &Value,
        partition_key: Option<String>,
    ) -> Result<Provisioned> {
        let path = if resource_link.is_empty() {
            resource_type.to_string()
        } else {
            format!("{}/{}", resource_link, resource_type)
        };
        let url = format!("{}/{}", self.config.endpoint, path);

        let date = rfc1123_date(Utc::now());
        let token = authorization_token(&self.config.key, "POST", resource_type, resource_link, &date)?;

        let mut request = self
            .client
            .request(Method::POST, &url)
            .header("authorization", token)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = partition_key {
            request = request.header("x-ms-documentdb-partitionkey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        debug!(%url, %status, "cosmos create");
        if let Some(outcome) = Self::provisioned_from(status) {
            return Ok(outcome);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(format!(
                "Cosmos DB rejected the request ({}): {}",
                status, error_text
            ))),
            _ => Err(Error::Store(format!(
                "creating {} failed with status {}: {}",
                path, status, error_text
            ))),
        }
    }
}

#[async_trait]
impl DocumentStore for CosmosClient {
    async fn create_database_if_not_exists(&self, database: &str) -> Result<Provisioned> {
        self.create("dbs", "", &json!({ "id": database }), None).await
    }

    async fn create_container_if_not_exists(&self, target: &StoreTarget) -> Result<Provisioned> {
        let body = json!({
            "id": target.container,
            "partitionKey": {
                "paths": [target.partition_key_path],
                "kind": "Hash"
            }
        });
        self.create("colls", &format!("dbs/{}", target.database), &body, None)
            .await
    }

    async fn create_item(&self, target: &StoreTarget, record: &Record) -> Result<Provisioned> {
        if record.id().is_none() {
            return Err(Error::InvalidInput("record has no 'id'".to_string()));
        }
        let partition_key = Self::partition_key_header(record, &target.partition_key_path)?;
        let link = format!("dbs/{}/colls/{}", target.database, target.container);
        let body = serde_json::to_value(record)?;
        self.create("docs", &link, &body, Some(partition_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CosmosClient::provisioned_from(StatusCode::CREATED),
            Some(Provisioned::Created)
        );
        assert_eq!(
            CosmosClient::provisioned_from(StatusCode::CONFLICT),
            Some(Provisioned::AlreadyExists)
        );
        assert_eq!(CosmosClient::provisioned_from(StatusCode::TOO_MANY_REQUESTS), None);
    }

    #[test]
    fn test_partition_key_header() {
        let mut record = Record::new();
        record.set_id("5b1c");
        assert_eq!(
            CosmosClient::partition_key_header(&record, "/id").unwrap(),
            r#"["5b1c"]"#
        );
        assert!(CosmosClient::partition_key_header(&record, "/category").is_err());
    }

    #[tokio::test]
    async fn test_item_without_id_is_rejected_before_sending() {
        let client = CosmosClient::new(CosmosConfig::new(
            "http://127.0.0.1:9".to_string(),
            "a2V5".to_string(),
            "AccountEndpoint=x;".to_string(),
        ))
        .unwrap();
        let target = certvec_core::DatasetProfile::Services.store_target();

        let err = client.create_item(&target, &Record::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
