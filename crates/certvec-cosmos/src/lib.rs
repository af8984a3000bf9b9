//! Azure Cosmos DB integration for certvec
//!
//! This crate provides the Cosmos DB (SQL API) implementation of the
//! `DocumentStore` trait over the REST API with master-key authorization.

mod auth;
mod client;
mod config;

pub use auth::{authorization_token, rfc1123_date};
pub use client::CosmosClient;
pub use config::CosmosConfig;

// Re-export core types for convenience
pub use certvec_core::{DocumentStore, Error, Provisioned, Result, StoreTarget};
