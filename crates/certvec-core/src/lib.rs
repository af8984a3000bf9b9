//! Core traits and types for certvec
//!
//! This crate defines the record type, the provider traits for the hosted
//! services (embeddings, chat, document store, search), the index schema
//! types, the retry policy around embedding calls and the dataset profiles
//! that tie names and fields together.

pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod memory;
pub mod profile;
pub mod record;
pub mod retry;
pub mod store;

pub use error::{Error, Result};
pub use index::{
    DataSourceDefinition, HnswParameters, IndexerDefinition, SearchField, SearchHit,
    SearchIndexDefinition, SearchService, SemanticConfiguration, VectorQuery, VectorSearch,
};
pub use llm::{ChatMessage, ChatProvider, ChatRole, EmbeddingProvider};
pub use memory::{MemorySearch, MemoryStore};
pub use profile::{DatasetProfile, EmbeddingTarget};
pub use record::Record;
pub use retry::{RetryPolicy, RetryingEmbedder};
pub use store::{DocumentStore, Provisioned, StoreTarget};
