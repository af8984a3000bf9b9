//! Document store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Record, Result};

/// Outcome of an idempotent create call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

impl Provisioned {
    pub fn is_created(self) -> bool {
        matches!(self, Provisioned::Created)
    }
}

/// Where records are written: database, container and partition key path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTarget {
    pub database: String,
    pub container: String,
    pub partition_key_path: String,
}

/// Trait for document databases (e.g., Azure Cosmos DB)
///
/// Every create call tolerates an existing resource: it reports
/// `Provisioned::AlreadyExists` and leaves the stored resource untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the database unless it already exists
    async fn create_database_if_not_exists(&self, database: &str) -> Result<Provisioned>;

    /// Create the container unless it already exists
    async fn create_container_if_not_exists(&self, target: &StoreTarget) -> Result<Provisioned>;

    /// Insert a record; an item with the same id is left as it is
    async fn create_item(&self, target: &StoreTarget, record: &Record) -> Result<Provisioned>;
}
