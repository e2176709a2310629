mod config;
mod config_error;
pub mod error;
mod manager;
mod migrations;
mod models;
mod repositories;
mod types;

#[cfg(test)]
mod tests;

pub use config::{RepositoryManagerConfig, RepositoryManagerConfigRaw};
pub use config_error::ConfigError;
pub use manager::RepositoryManager;
pub use repositories::{
    address_repository::AddressRepository,
    chain_repository::ChainRepository,
    location_proof_repository::{BoundingBox, LocationProofFilter, LocationProofRepository},
    sync_state_repository::SyncStateRepository,
};
pub use types::{
    BatchSummary, ChainRecord, LocationProofEntry, NewLocationProof, SyncStateEntry,
};
