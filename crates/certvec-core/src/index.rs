//! Search index schema types and the search service trait
//!
//! The schema types serialize to the JSON shape the Azure AI Search REST
//! API (2023-11-01) expects, so a client can send them as request bodies
//! unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Record, Result};

/// Field data types used by the indexes we declare
pub const EDM_STRING: &str = "Edm.String";
pub const EDM_SINGLE_COLLECTION: &str = "Collection(Edm.Single)";

/// A field in a search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filterable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrievable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl SearchField {
    /// The document key field
    pub fn key(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: EDM_STRING.to_string(),
            key: true,
            searchable: None,
            filterable: None,
            retrievable: None,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    /// A full-text searchable, retrievable string field
    pub fn searchable(name: &str) -> Self {
        Self {
            key: false,
            searchable: Some(true),
            retrievable: Some(true),
            ..Self::key(name)
        }
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = Some(true);
        self
    }

    /// A vector field of single-precision floats
    pub fn vector(name: &str, dimensions: usize, profile: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: EDM_SINGLE_COLLECTION.to_string(),
            key: false,
            searchable: Some(true),
            filterable: None,
            retrievable: Some(true),
            dimensions: Some(dimensions),
            vector_search_profile: Some(profile.to_string()),
        }
    }

    pub fn is_vector(&self) -> bool {
        self.dimensions.is_some()
    }
}

/// HNSW graph parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HnswParameters {
    /// Bi-directional links per node
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchAlgorithm {
    pub name: String,
    pub kind: String,
    pub hnsw_parameters: HnswParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchProfile {
    pub name: String,
    pub algorithm: String,
}

/// Vector search configuration of an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearch {
    pub algorithms: Vec<VectorSearchAlgorithm>,
    pub profiles: Vec<VectorSearchProfile>,
}

impl VectorSearch {
    /// One HNSW algorithm and one profile pointing at it
    pub fn hnsw(algorithm: &str, profile: &str, parameters: HnswParameters) -> Self {
        Self {
            algorithms: vec![VectorSearchAlgorithm {
                name: algorithm.to_string(),
                kind: "hnsw".to_string(),
                hnsw_parameters: parameters,
            }],
            profiles: vec![VectorSearchProfile {
                name: profile.to_string(),
                algorithm: algorithm.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticField {
    pub field_name: String,
}

impl SemanticField {
    pub fn new(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedFields {
    pub title_field: SemanticField,
    pub prioritized_content_fields: Vec<SemanticField>,
    pub prioritized_keywords_fields: Vec<SemanticField>,
}

/// Fields the semantic ranker reads, by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConfiguration {
    pub name: String,
    pub prioritized_fields: PrioritizedFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSettings {
    pub configurations: Vec<SemanticConfiguration>,
}

/// Complete definition of a search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndexDefinition {
    pub name: String,
    pub fields: Vec<SearchField>,
    pub vector_search: VectorSearch,
    pub semantic: SemanticSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceCredentials {
    pub connection_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContainer {
    pub name: String,
}

/// Connection the indexer pulls documents from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub credentials: DataSourceCredentials,
    pub container: DataContainer,
}

impl DataSourceDefinition {
    /// A Cosmos DB (SQL API) data source. The database is appended to the
    /// account connection string, which already ends with `;`.
    pub fn cosmos_db(name: &str, connection_string: &str, database: &str, container: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "cosmosdb".to_string(),
            credentials: DataSourceCredentials {
                connection_string: format!("{}Database={}", connection_string, database),
            },
            container: DataContainer {
                name: container.to_string(),
            },
        }
    }
}

/// Indexer copying documents from a data source into an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerDefinition {
    pub name: String,
    pub data_source_name: String,
    pub target_index_name: String,
}

/// A pure vector query against one vector field
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    /// Number of nearest neighbours to return
    pub k: usize,
    pub field: String,
    pub select: Vec<String>,
}

/// A scored document returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f64,
    pub document: Record,
}

/// Trait for managed search services (e.g., Azure AI Search)
///
/// The create-or-update calls are idempotent: sending the same definition
/// twice leaves the service in the same state and keeps indexed documents.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn create_or_update_index(&self, index: &SearchIndexDefinition) -> Result<String>;

    async fn create_or_update_data_source(&self, data_source: &DataSourceDefinition) -> Result<String>;

    async fn create_or_update_indexer(&self, indexer: &IndexerDefinition) -> Result<String>;

    async fn get_indexer(&self, name: &str) -> Result<IndexerDefinition>;

    /// Ask the service to run an indexer now
    async fn run_indexer(&self, name: &str) -> Result<()>;

    async fn vector_search(&self, index: &str, query: &VectorQuery) -> Result<Vec<SearchHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vector_field_shape() {
        let field = SearchField::vector("contentVector", 1536, "my-vector-profile");
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "contentVector",
                "type": "Collection(Edm.Single)",
                "key": false,
                "searchable": true,
                "retrievable": true,
                "dimensions": 1536,
                "vectorSearchProfile": "my-vector-profile"
            })
        );
    }

    #[test]
    fn test_filterable_field_shape() {
        let field = SearchField::searchable("category").filterable();
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "category",
                "type": "Edm.String",
                "key": false,
                "searchable": true,
                "filterable": true,
                "retrievable": true
            })
        );
    }

    #[test]
    fn test_cosmos_data_source_appends_database() {
        let ds = DataSourceDefinition::cosmos_db(
            "project-indexer",
            "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=k;",
            "CertificationData",
            "Certifications",
        );
        assert_eq!(
            ds.credentials.connection_string,
            "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=k;Database=CertificationData"
        );
        assert_eq!(serde_json::to_value(&ds).unwrap()["type"], json!("cosmosdb"));
    }

    #[test]
    fn test_hnsw_parameters_camel_case() {
        let vs = VectorSearch::hnsw(
            "my-vector-config",
            "my-vector-profile",
            HnswParameters {
                m: 4,
                ef_construction: 400,
                ef_search: 1000,
                metric: "cosine".to_string(),
            },
        );
        let value = serde_json::to_value(&vs).unwrap();
        assert_eq!(value["algorithms"][0]["hnswParameters"]["efConstruction"], json!(400));
        assert_eq!(value["profiles"][0]["algorithm"], json!("my-vector-config"));
    }
}
