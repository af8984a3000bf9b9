//! Dataset profiles
//!
//! A profile fixes every name the pipeline needs for one dataset: where the
//! records live in the document store, which fields get embedded, and how
//! the search index over them is declared and queried.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::index::{
    HnswParameters, PrioritizedFields, SearchField, SearchIndexDefinition, SemanticConfiguration,
    SemanticField, SemanticSettings, VectorSearch,
};
use crate::{Error, StoreTarget};

/// Dimensions of the ada-002 embedding model
pub const EMBEDDING_DIMENSIONS: usize = 1536;

pub const VECTOR_ALGORITHM_NAME: &str = "my-vector-config";
pub const VECTOR_PROFILE_NAME: &str = "my-vector-profile";
pub const SEMANTIC_CONFIG_NAME: &str = "my-semantic-config";

/// A text field and the vector field its embedding is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingTarget {
    pub source: &'static str,
    pub vector: &'static str,
}

/// The datasets this toolkit knows how to process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetProfile {
    /// Flattened certification / skill / service records
    Certifications,
    /// The Azure services catalog (title, content, category)
    Services,
}

impl DatasetProfile {
    pub fn database(self) -> &'static str {
        match self {
            Self::Certifications => "CertificationData",
            Self::Services => "VectorSearchTutorial",
        }
    }

    pub fn container(self) -> &'static str {
        match self {
            Self::Certifications => "Certifications",
            Self::Services => "AzureServices",
        }
    }

    pub fn store_target(self) -> StoreTarget {
        StoreTarget {
            database: self.database().to_string(),
            container: self.container().to_string(),
            partition_key_path: "/id".to_string(),
        }
    }

    pub fn index_name(self) -> &'static str {
        match self {
            Self::Certifications => "project-generator-index",
            Self::Services => "cosmosdb-vector-search-index",
        }
    }

    pub fn data_source_name(self) -> &'static str {
        match self {
            Self::Certifications => "project-indexer",
            Self::Services => "cosmosdb-tutorial-indexer",
        }
    }

    pub fn indexer_name(self) -> &'static str {
        match self {
            Self::Certifications => "project-generator-indexer",
            Self::Services => "cosmosdb-tutorial-indexer",
        }
    }

    pub fn embedding_targets(self) -> &'static [EmbeddingTarget] {
        match self {
            Self::Certifications => &[
                EmbeddingTarget {
                    source: "certification_name",
                    vector: "certificationNameVector",
                },
                EmbeddingTarget {
                    source: "service_name",
                    vector: "certificationServiceVector",
                },
            ],
            Self::Services => &[
                EmbeddingTarget {
                    source: "title",
                    vector: "titleVector",
                },
                EmbeddingTarget {
                    source: "content",
                    vector: "contentVector",
                },
            ],
        }
    }

    /// Vector field the question loop searches
    pub fn query_vector_field(self) -> &'static str {
        match self {
            Self::Certifications => "certificationServiceVector",
            Self::Services => "contentVector",
        }
    }

    /// Fields returned with each hit and handed to the chat model
    pub fn answer_fields(self) -> &'static [&'static str] {
        match self {
            Self::Certifications => &[
                "certification_name",
                "skill_name",
                "service_name",
                "service_description",
                "category",
            ],
            Self::Services => &["title", "content", "category"],
        }
    }

    fn text_fields(self) -> Vec<SearchField> {
        match self {
            Self::Certifications => vec![
                SearchField::searchable("certification_name"),
                SearchField::searchable("skill_name"),
                SearchField::searchable("service_name"),
                SearchField::searchable("service_description"),
                SearchField::searchable("category"),
            ],
            Self::Services => vec![
                SearchField::searchable("title"),
                SearchField::searchable("content"),
                SearchField::searchable("category").filterable(),
            ],
        }
    }

    fn hnsw_parameters(self) -> HnswParameters {
        let m = match self {
            Self::Certifications => 5,
            Self::Services => 4,
        };
        HnswParameters {
            m,
            ef_construction: 400,
            ef_search: 1000,
            metric: "cosine".to_string(),
        }
    }

    fn semantic_configuration(self) -> SemanticConfiguration {
        let (title, content) = match self {
            Self::Certifications => ("certification_name", "service_name"),
            Self::Services => ("title", "content"),
        };
        SemanticConfiguration {
            name: SEMANTIC_CONFIG_NAME.to_string(),
            prioritized_fields: PrioritizedFields {
                title_field: SemanticField::new(title),
                prioritized_content_fields: vec![SemanticField::new(content)],
                prioritized_keywords_fields: vec![SemanticField::new("category")],
            },
        }
    }

    /// Full index definition: key, text fields, one vector field per
    /// embedding target, HNSW vector search and the semantic configuration
    pub fn index_definition(self) -> SearchIndexDefinition {
        let mut fields = vec![SearchField::key("id")];
        fields.extend(self.text_fields());
        fields.extend(self.embedding_targets().iter().map(|t| {
            SearchField::vector(t.vector, EMBEDDING_DIMENSIONS, VECTOR_PROFILE_NAME)
        }));

        SearchIndexDefinition {
            name: self.index_name().to_string(),
            fields,
            vector_search: VectorSearch::hnsw(
                VECTOR_ALGORITHM_NAME,
                VECTOR_PROFILE_NAME,
                self.hnsw_parameters(),
            ),
            semantic: SemanticSettings {
                configurations: vec![self.semantic_configuration()],
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Certifications => "certifications",
            Self::Services => "services",
        }
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "certifications" | "certs" => Ok(Self::Certifications),
            "services" => Ok(Self::Services),
            other => Err(Error::InvalidInput(format!(
                "unknown dataset profile '{}' (expected 'certifications' or 'services')",
                other
            ))),
        }
    }
}
