use astral_domain::ChainId;
use astral_repository::{RepositoryManagerConfig, RepositoryManagerConfigRaw};
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
    sync::SyncConfig,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub environment: String,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub sync: SyncConfig,
    pub repository: RepositoryManagerConfigRaw,
    pub chains: Vec<ChainConfigRaw>,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub sync: SyncConfig,
    pub repository: RepositoryManagerConfig,
    pub chains: Vec<ChainConfig>,
}

impl ConfigRaw {
    /// Validates raw values and resolves secrets.
    ///
    /// A misconfigured chain is excluded with a warning instead of failing
    /// startup, so one bad entry cannot take the other chains down with it.
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        let mut chains = Vec::with_capacity(self.chains.len());
        for chain in &self.chains {
            if !chain.enabled {
                continue;
            }
            match chain.resolve() {
                Ok(resolved) => chains.push(resolved),
                Err(error) => tracing::warn!(
                    chain_id = chain.chain_id,
                    name = %chain.name,
                    %error,
                    "Excluding misconfigured chain from sync"
                ),
            }
        }

        Ok(Config {
            logger: self.logger,
            telemetry: self.telemetry,
            sync: self.sync,
            repository: self.repository.resolve()?,
            chains,
        })
    }
}

/// Raw per-chain configuration as it appears in config files.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ChainConfigRaw {
    pub enabled: bool,
    /// EIP-155 chain id.
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    /// EAS-style GraphQL index endpoint.
    pub eas_endpoint: Option<String>,
    /// Attestation schema to sync. No default: every deployment targets its
    /// own schema.
    pub schema_uid: Option<String>,
    /// Block to start syncing from when no cursor exists yet.
    pub deployment_block: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ChainConfig {
    pub chain_id: ChainId,
    pub name: String,
    pub symbol: String,
    pub eas_endpoint: String,
    pub schema_uid: String,
    pub deployment_block: u64,
}

impl ChainConfigRaw {
    fn resolve(&self) -> Result<ChainConfig, ConfigError> {
        let eas_endpoint = self
            .eas_endpoint
            .clone()
            .ok_or_else(|| ConfigError::InvalidConfig("eas_endpoint is required".to_string()))?;
        let schema_uid = self
            .schema_uid
            .clone()
            .ok_or_else(|| ConfigError::InvalidConfig("schema_uid is required".to_string()))?;

        Ok(ChainConfig {
            chain_id: ChainId::from(self.chain_id),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            eas_endpoint,
            schema_uid,
            deployment_block: self.deployment_block,
        })
    }
}
