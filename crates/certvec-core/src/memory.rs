//! In-memory store and search implementations
//!
//! These follow the same idempotency rules as the hosted services and are
//! used by tests and dry runs.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::index::{
    DataSourceDefinition, IndexerDefinition, SearchHit, SearchIndexDefinition, SearchService,
    VectorQuery,
};
use crate::{DocumentStore, Error, Provisioned, Record, Result, StoreTarget};

type Containers = HashMap<(String, String), BTreeMap<String, Record>>;

/// Document store keeping everything in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    databases: Arc<RwLock<BTreeSet<String>>>,
    containers: Arc<RwLock<Containers>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records of a container, ordered by id
    pub fn items(&self, target: &StoreTarget) -> Vec<Record> {
        self.containers
            .read()
            .map(|c| {
                c.get(&(target.database.clone(), target.container.clone()))
                    .map(|items| items.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> Error {
        Error::Store(format!("Lock error: {}", e))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_database_if_not_exists(&self, database: &str) -> Result<Provisioned> {
        let mut dbs = self.databases.write().map_err(Self::lock_error)?;
        if dbs.insert(database.to_string()) {
            Ok(Provisioned::Created)
        } else {
            Ok(Provisioned::AlreadyExists)
        }
    }

    async fn create_container_if_not_exists(&self, target: &StoreTarget) -> Result<Provisioned> {
        if !self
            .databases
            .read()
            .map_err(Self::lock_error)?
            .contains(&target.database)
        {
            return Err(Error::Store(format!("database '{}' not found", target.database)));
        }

        let mut containers = self.containers.write().map_err(Self::lock_error)?;
        let key = (target.database.clone(), target.container.clone());
        if containers.contains_key(&key) {
            return Ok(Provisioned::AlreadyExists);
        }
        containers.insert(key, BTreeMap::new());
        Ok(Provisioned::Created)
    }

    async fn create_item(&self, target: &StoreTarget, record: &Record) -> Result<Provisioned> {
        let id = record
            .id()
            .ok_or_else(|| Error::InvalidInput("record has no 'id'".to_string()))?;

        let mut containers = self.containers.write().map_err(Self::lock_error)?;
        let items = containers
            .get_mut(&(target.database.clone(), target.container.clone()))
            .ok_or_else(|| Error::Store(format!("container '{}' not found", target.container)))?;

        if items.contains_key(id) {
            return Ok(Provisioned::AlreadyExists);
        }
        items.insert(id.to_string(), record.clone());
        Ok(Provisioned::Created)
    }
}

#[derive(Default)]
struct SearchState {
    indexes: HashMap<String, SearchIndexDefinition>,
    data_sources: HashMap<String, DataSourceDefinition>,
    indexers: HashMap<String, IndexerDefinition>,
    documents: HashMap<String, Vec<Record>>,
}

/// Search service over an in-memory store, ranking by cosine similarity
///
/// Running an indexer copies the container its data source points at into
/// the target index, so queries see exactly what was loaded.
#[derive(Clone)]
pub struct MemorySearch {
    store: MemoryStore,
    state: Arc<RwLock<SearchState>>,
}

impl MemorySearch {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(SearchState::default())),
        }
    }

    pub fn index(&self, name: &str) -> Option<SearchIndexDefinition> {
        self.state.read().ok()?.indexes.get(name).cloned()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.state
            .read()
            .map(|s| s.documents.get(index).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> Error {
        Error::Search(format!("Lock error: {}", e))
    }

    /// Database named in a Cosmos DB connection string
    fn database_of(data_source: &DataSourceDefinition) -> Option<String> {
        data_source
            .credentials
            .connection_string
            .split(';')
            .find_map(|part| part.strip_prefix("Database="))
            .map(str::to_string)
    }
}

#[async_trait]
impl SearchService for MemorySearch {
    async fn create_or_update_index(&self, index: &SearchIndexDefinition) -> Result<String> {
        let mut state = self.state.write().map_err(Self::lock_error)?;
        state.indexes.insert(index.name.clone(), index.clone());
        state.documents.entry(index.name.clone()).or_default();
        Ok(index.name.clone())
    }

    async fn create_or_update_data_source(&self, data_source: &DataSourceDefinition) -> Result<String> {
        let mut state = self.state.write().map_err(Self::lock_error)?;
        state
            .data_sources
            .insert(data_source.name.clone(), data_source.clone());
        Ok(data_source.name.clone())
    }

    async fn create_or_update_indexer(&self, indexer: &IndexerDefinition) -> Result<String> {
        let mut state = self.state.write().map_err(Self::lock_error)?;
        if !state.data_sources.contains_key(&indexer.data_source_name) {
            return Err(Error::Search(format!(
                "data source '{}' not found",
                indexer.data_source_name
            )));
        }
        if !state.indexes.contains_key(&indexer.target_index_name) {
            return Err(Error::Search(format!(
                "index '{}' not found",
                indexer.target_index_name
            )));
        }
        state.indexers.insert(indexer.name.clone(), indexer.clone());
        Ok(indexer.name.clone())
    }

    async fn get_indexer(&self, name: &str) -> Result<IndexerDefinition> {
        self.state
            .read()
            .map_err(Self::lock_error)?
            .indexers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Search(format!("indexer '{}' not found", name)))
    }

    async fn run_indexer(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().map_err(Self::lock_error)?;
        let indexer = state
            .indexers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Search(format!("indexer '{}' not found", name)))?;
        let data_source = state
            .data_sources
            .get(&indexer.data_source_name)
            .cloned()
            .ok_or_else(|| Error::Search(format!("data source '{}' not found", indexer.data_source_name)))?;
        let database = Self::database_of(&data_source).ok_or_else(|| {
            Error::Search(format!("data source '{}' names no database", data_source.name))
        })?;

        let target = StoreTarget {
            database,
            container: data_source.container.name.clone(),
            partition_key_path: "/id".to_string(),
        };
        let documents = self.store.items(&target);
        state.documents.insert(indexer.target_index_name, documents);
        Ok(())
    }

    async fn vector_search(&self, index: &str, query: &VectorQuery) -> Result<Vec<SearchHit>> {
        let state = self.state.read().map_err(Self::lock_error)?;
        let documents = state
            .documents
            .get(index)
            .ok_or_else(|| Error::Search(format!("index '{}' not found", index)))?;

        let mut hits: Vec<SearchHit> = documents
            .iter()
            .filter_map(|doc| {
                let vector = doc.vector(&query.field)?;
                let score = Self::cosine_similarity(&query.vector, &vector) as f64;
                let mut selected = Record::new();
                for field in &query.select {
                    if let Some(value) = doc.get(field) {
                        selected.insert(field.clone(), value.clone());
                    }
                }
                if query.select.is_empty() {
                    selected = doc.clone();
                }
                Some(SearchHit {
                    score,
                    document: selected,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetProfile;
    use serde_json::json;

    fn doc(id: &str, vector: [f32; 2]) -> Record {
        let mut rec: Record =
            serde_json::from_value(json!({"id": id, "title": format!("title {id}")})).unwrap();
        rec.set_vector("contentVector", vector.to_vec());
        rec
    }

    #[tokio::test]
    async fn test_store_create_calls_are_idempotent() {
        let store = MemoryStore::new();
        let target = DatasetProfile::Services.store_target();

        assert_eq!(
            store.create_database_if_not_exists(&target.database).await.unwrap(),
            Provisioned::Created
        );
        assert_eq!(
            store.create_database_if_not_exists(&target.database).await.unwrap(),
            Provisioned::AlreadyExists
        );
        assert!(store.create_container_if_not_exists(&target).await.unwrap().is_created());
        assert_eq!(
            store.create_container_if_not_exists(&target).await.unwrap(),
            Provisioned::AlreadyExists
        );

        let original = doc("a", [1.0, 0.0]);
        let mut replacement = doc("a", [0.0, 1.0]);
        replacement.insert("title", "changed");

        assert!(store.create_item(&target, &original).await.unwrap().is_created());
        assert_eq!(
            store.create_item(&target, &replacement).await.unwrap(),
            Provisioned::AlreadyExists
        );
        assert_eq!(store.items(&target), vec![original]);
    }

    #[tokio::test]
    async fn test_container_requires_database() {
        let store = MemoryStore::new();
        let target = DatasetProfile::Services.store_target();
        assert!(store.create_container_if_not_exists(&target).await.is_err());
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_cosine() {
        let store = MemoryStore::new();
        let target = DatasetProfile::Services.store_target();
        store.create_database_if_not_exists(&target.database).await.unwrap();
        store.create_container_if_not_exists(&target).await.unwrap();
        for rec in [doc("a", [1.0, 0.0]), doc("b", [0.7, 0.7]), doc("c", [0.0, 1.0])] {
            store.create_item(&target, &rec).await.unwrap();
        }

        let search = MemorySearch::new(store);
        let profile = DatasetProfile::Services;
        search.create_or_update_index(&profile.index_definition()).await.unwrap();
        search
            .create_or_update_data_source(&DataSourceDefinition::cosmos_db(
                profile.data_source_name(),
                "AccountEndpoint=x;",
                profile.database(),
                profile.container(),
            ))
            .await
            .unwrap();
        search
            .create_or_update_indexer(&IndexerDefinition {
                name: profile.indexer_name().to_string(),
                data_source_name: profile.data_source_name().to_string(),
                target_index_name: profile.index_name().to_string(),
            })
            .await
            .unwrap();
        search.run_indexer(profile.indexer_name()).await.unwrap();
        assert_eq!(search.document_count(profile.index_name()), 3);

        let hits = search
            .vector_search(
                profile.index_name(),
                &VectorQuery {
                    vector: vec![0.0, 1.0],
                    k: 2,
                    field: "contentVector".to_string(),
                    select: vec!["title".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.get("title"), Some(&json!("title c")));
        assert_eq!(hits[1].document.get("title"), Some(&json!("title b")));
        assert!(hits[0].document.get("contentVector").is_none());
    }

    #[tokio::test]
    async fn test_indexer_requires_index_and_data_source() {
        let search = MemorySearch::new(MemoryStore::new());
        let err = search
            .create_or_update_indexer(&IndexerDefinition {
                name: "i".to_string(),
                data_source_name: "missing".to_string(),
                target_index_name: "missing".to_string(),
            })
            .await;
        assert!(err.is_err());
    }
}
