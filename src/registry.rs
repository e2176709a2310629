use std::sync::Arc;

use astral_domain::ChainId;
use astral_eas_client::{AttestationIndex, EasClientConfig, EasIndexClient};
use astral_repository::RepositoryManager;

use crate::{config::ChainConfig, error::NodeError, sync::SyncConfig};

/// One chain the engine syncs: its identity, the schema it tracks, and the
/// client for its attestation index.
#[derive(Clone)]
pub(crate) struct ChainHandle {
    pub chain_id: ChainId,
    pub name: String,
    pub schema_uid: String,
    pub deployment_block: u64,
    pub index: Arc<dyn AttestationIndex>,
}

/// All chains enabled in the current configuration.
pub(crate) struct ChainRegistry {
    chains: Vec<ChainHandle>,
}

impl ChainRegistry {
    /// Builds an index client per configured chain and mirrors the
    /// configuration into the chain table, so the database always reflects
    /// what this deployment syncs.
    pub(crate) async fn initialize(
        chains: &[ChainConfig],
        sync_config: &SyncConfig,
        repository: &RepositoryManager,
    ) -> Result<Self, NodeError> {
        let client_config = EasClientConfig {
            connect_timeout_ms: sync_config.connect_timeout_ms,
            request_timeout_ms: sync_config.request_timeout_ms,
        };

        let chain_repository = repository.chain_repository();

        let mut handles = Vec::with_capacity(chains.len());
        for chain in chains {
            let index = EasIndexClient::new(chain.eas_endpoint.clone(), &client_config)?;

            chain_repository
                .upsert_chain(
                    chain.chain_id,
                    &chain.name,
                    &chain.symbol,
                    &chain.eas_endpoint,
                    &chain.schema_uid,
                    chain.deployment_block,
                )
                .await?;

            tracing::info!(
                chain_id = %chain.chain_id,
                name = %chain.name,
                endpoint = %chain.eas_endpoint,
                "Registered chain for attestation sync"
            );

            handles.push(ChainHandle {
                chain_id: chain.chain_id,
                name: chain.name.clone(),
                schema_uid: chain.schema_uid.clone(),
                deployment_block: chain.deployment_block,
                index: Arc::new(index),
            });
        }

        Ok(Self { chains: handles })
    }

    #[cfg(test)]
    pub(crate) fn with_chains(chains: Vec<ChainHandle>) -> Self {
        Self { chains }
    }

    pub(crate) fn chains(&self) -> &[ChainHandle] {
        &self.chains
    }

    pub(crate) fn get(&self, chain_id: ChainId) -> Option<&ChainHandle> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
