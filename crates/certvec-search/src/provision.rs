//! Index, data source and indexer provisioning

use serde::Serialize;
use tracing::info;

use certvec_core::index::{DataSourceDefinition, IndexerDefinition};
use certvec_core::{DatasetProfile, Result, SearchService};

/// Names of what was provisioned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionReport {
    pub index: String,
    pub data_source: String,
    pub indexer: String,
    pub ran: bool,
}

/// Declare the profile's index, connect it to the Cosmos DB container
/// through a data source and an indexer, and optionally run the indexer.
///
/// Every step is create-or-update, so running this again keeps the
/// existing index and its documents.
pub async fn provision<S: SearchService + ?Sized>(
    service: &S,
    profile: DatasetProfile,
    cosmos_connection_string: &str,
    run: bool,
) -> Result<ProvisionReport> {
    let index = service
        .create_or_update_index(&profile.index_definition())
        .await?;

    let data_source = service
        .create_or_update_data_source(&DataSourceDefinition::cosmos_db(
            profile.data_source_name(),
            cosmos_connection_string,
            profile.database(),
            profile.container(),
        ))
        .await?;

    let indexer = IndexerDefinition {
        name: profile.indexer_name().to_string(),
        data_source_name: data_source.clone(),
        target_index_name: index.clone(),
    };
    service.create_or_update_indexer(&indexer).await?;
    let indexer = service.get_indexer(&indexer.name).await?;
    info!(indexer = %indexer.name, index = %indexer.target_index_name, "indexer ready");

    if run {
        service.run_indexer(&indexer.name).await?;
    }

    Ok(ProvisionReport {
        index,
        data_source,
        indexer: indexer.name,
        ran: run,
    })
}
