//! Azure AI Search integration for certvec
//!
//! This crate provides the Azure AI Search implementation of the
//! `SearchService` trait and the provisioning sequence that wires a
//! Cosmos DB container to a vector index through an indexer.

mod client;
mod config;
mod provision;


pub use client::SearchClient;
pub use config::SearchServiceConfig;
pub use provision::{ProvisionReport, provision};

// Re-export core types for convenience
pub use certvec_core::{Error, Result, SearchService};
