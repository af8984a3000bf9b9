//! Azure AI Search client implementation

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use certvec_core::index::{
    DataSourceDefinition, IndexerDefinition, SearchHit, SearchIndexDefinition, VectorQuery,
};
use certvec_core::{Error, Record, Result, SearchService};

use crate::config::SearchServiceConfig;

/// Azure AI Search REST client
pub struct SearchClient {
    config: SearchServiceConfig,
    client: Client,
}

impl SearchClient {
    pub fn new(config: SearchServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SearchServiceConfig::from_env()?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.config.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("api-key", &self.config.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        debug!(%method, path, status = %response.status(), "search request");

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(format!(
                "search service rejected the api key ({})",
                status
            ))),
            _ => Err(Error::Search(format!(
                "{} {} failed with status {}: {}",
                method, path, status, error_text
            ))),
        }
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PUT, path, Some(body)).await.map(|_| ())
    }

    /// Request body of a pure vector query
    pub fn search_body(query: &VectorQuery) -> Value {
        json!({
            "vectorQueries": [{
                "kind": "vector",
                "vector": query.vector,
                "k": query.k,
                "fields": query.field,
            }],
            "select": query.select.join(","),
            "top": query.k,
        })
    }

    /// Hits of a search response; `@search.*` annotations are removed from
    /// the documents and the score kept separately
    pub fn parse_hits(body: &Value) -> Result<Vec<SearchHit>> {
        let values = body
            .get("value")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Search("search response has no 'value' array".to_string()))?;

        values
            .iter()
            .map(|value| {
                let object = value
                    .as_object()
                    .ok_or_else(|| Error::Search("search hit is not an object".to_string()))?;
                let score = object
                    .get("@search.score")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let document = object
                    .iter()
                    .filter(|(k, _)| !k.starts_with("@search."))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<serde_json::Map<_, _>>();
                Ok(SearchHit {
                    score,
                    document: Record::from(document),
                })
            })
            .collect()
    }
}

#[async_trait]
impl SearchService for SearchClient {
    async fn create_or_update_index(&self, index: &SearchIndexDefinition) -> Result<String> {
        self.put(&format!("indexes/{}", index.name), index).await?;
        info!(index = %index.name, "index created or updated");
        Ok(index.name.clone())
    }

    async fn create_or_update_data_source(&self, data_source: &DataSourceDefinition) -> Result<String> {
        self.put(&format!("datasources/{}", data_source.name), data_source)
            .await?;
        info!(data_source = %data_source.name, "data source created or updated");
        Ok(data_source.name.clone())
    }

    async fn create_or_update_indexer(&self, indexer: &IndexerDefinition) -> Result<String> {
        self.put(&format!("indexers/{}", indexer.name), indexer).await?;
        info!(indexer = %indexer.name, "indexer created or updated");
        Ok(indexer.name.clone())
    }

    async fn get_indexer(&self, name: &str) -> Result<IndexerDefinition> {
        let response = self
            .send::<Value>(Method::GET, &format!("indexers/{}", name), None)
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn run_indexer(&self, name: &str) -> Result<()> {
        self.send::<Value>(Method::POST, &format!("indexers/{}/run", name), None)
            .await?;
        info!(indexer = %name, "indexer run requested");
        Ok(())
    }

    async fn vector_search(&self, index: &str, query: &VectorQuery) -> Result<Vec<SearchHit>> {
        let body = Self::search_body(query);
        let response = self
            .send(Method::POST, &format!("indexes/{}/docs/search", index), Some(&body))
            .await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Self::parse_hits(&value)
    }
}
