//! Load records into a document store

use serde::Serialize;
use tracing::{info, warn};

use certvec_core::{DocumentStore, Provisioned, Record, Result, StoreTarget};

/// What a load pass did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub database: Provisioned,
    pub container: Provisioned,
    pub created: usize,
    pub existing: usize,
}

/// Ensure the database and container exist, then insert every record.
///
/// Records whose id is already stored are counted and skipped; nothing
/// already in the store is replaced.
pub async fn load_records<S: DocumentStore + ?Sized>(
    store: &S,
    target: &StoreTarget,
    records: &[Record],
) -> Result<LoadReport> {
    let database = store.create_database_if_not_exists(&target.database).await?;
    match database {
        Provisioned::Created => info!(database = %target.database, "database created"),
        Provisioned::AlreadyExists => info!(database = %target.database, "database already exists"),
    }

    let container = store.create_container_if_not_exists(target).await?;
    match container {
        Provisioned::Created => info!(container = %target.container, "container created"),
        Provisioned::AlreadyExists => info!(container = %target.container, "container already exists"),
    }

    let mut report = LoadReport {
        database,
        container,
        created: 0,
        existing: 0,
    };

    for record in records {
        match store.create_item(target, record).await? {
            Provisioned::Created => report.created += 1,
            Provisioned::AlreadyExists => {
                warn!(id = record.id().unwrap_or("-"), "data item already exists");
                report.existing += 1;
            }
        }
    }

    info!(created = report.created, existing = report.existing, "records loaded");
    Ok(report)
}
