//! Dataset preparation for certvec
//!
//! The stages run in this order: join the services catalog into the
//! certifications catalog, flatten it into records, assign ids, attach
//! embeddings, and load the records into a document store.

mod catalog;
mod embed;
mod enrich;
mod identity;
mod io;
mod load;


pub use catalog::{
    AzureService, Certification, CertificationCatalog, ServiceCatalog, ServiceDetail, ServiceRef,
    Skill,
};
pub use embed::{EmbedReport, EmbeddingPipeline};
pub use enrich::{EnrichReport, enrich, flatten};
pub use identity::{assign_ids, ensure_ids};
pub use io::{read_json, write_json, write_json_pretty};
pub use load::{LoadReport, load_records};

// Re-export core types for convenience
pub use certvec_core::{DatasetProfile, Error, Record, Result};
