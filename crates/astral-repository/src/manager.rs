use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

pub use crate::config::RepositoryManagerConfig;
use crate::{
    error::RepositoryError,
    migrations::Migrator,
    repositories::{
        address_repository::AddressRepository, chain_repository::ChainRepository,
        location_proof_repository::LocationProofRepository,
        sync_state_repository::SyncStateRepository,
    },
};

pub struct RepositoryManager {
    address_repository: AddressRepository,
    chain_repository: ChainRepository,
    location_proof_repository: LocationProofRepository,
    sync_state_repository: SyncStateRepository,
}

impl RepositoryManager {
    /// Connects to the database and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if:
    /// - Database connection fails (e.g. database missing, bad credentials)
    /// - Migrations fail
    pub async fn connect(config: &RepositoryManagerConfig) -> Result<Self, RepositoryError> {
        let mut opt = ConnectOptions::new(config.connection_string());
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(true)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Self::connect_with(opt).await
    }

    /// Connects to an explicit database URL. Used by tests against in-memory
    /// SQLite; production goes through [`Self::connect`].
    ///
    /// Pinned to one pooled connection: an in-memory SQLite database is
    /// per-connection, so a larger pool would hand out empty databases.
    pub async fn connect_url(url: &str) -> Result<Self, RepositoryError> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(1);
        Self::connect_with(opt).await
    }

    async fn connect_with(opt: ConnectOptions) -> Result<Self, RepositoryError> {
        let conn = Arc::new(Database::connect(opt).await?);

        Migrator::up(conn.as_ref(), None).await?;

        Ok(RepositoryManager {
            address_repository: AddressRepository::new(Arc::clone(&conn)),
            chain_repository: ChainRepository::new(Arc::clone(&conn)),
            location_proof_repository: LocationProofRepository::new(Arc::clone(&conn)),
            sync_state_repository: SyncStateRepository::new(Arc::clone(&conn)),
        })
    }

    pub fn address_repository(&self) -> AddressRepository {
        self.address_repository.clone()
    }

    pub fn chain_repository(&self) -> ChainRepository {
        self.chain_repository.clone()
    }

    pub fn location_proof_repository(&self) -> LocationProofRepository {
        self.location_proof_repository.clone()
    }

    pub fn sync_state_repository(&self) -> SyncStateRepository {
        self.sync_state_repository.clone()
    }
}
