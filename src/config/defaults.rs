//! Typed default configurations for each environment.
//!
//! Each environment (development, testnet, mainnet) gets a fully constructed
//! [`ConfigRaw`] via [`config_for`], type-checked at compile time instead of
//! living in an embedded defaults file.
//!
//! Chains default to `enabled: false` with no schema: the endpoint catalogue
//! is maintained here, but every deployment has to opt a chain in and supply
//! the schema uid it indexes.

use astral_repository::RepositoryManagerConfigRaw;

use super::{ConfigError, ConfigRaw};
use crate::{
    config::raw::ChainConfigRaw,
    logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig},
    sync::SyncConfig,
};

/// Returns the default [`ConfigRaw`] for the given environment name.
pub(crate) fn config_for(environment: &str) -> Result<ConfigRaw, ConfigError> {
    match environment {
        "development" => Ok(development()),
        "testnet" => Ok(testnet()),
        "mainnet" => Ok(mainnet()),
        _ => Err(ConfigError::UnknownEnvironment(environment.to_string())),
    }
}

// ── Shared defaults (identical across all environments) ─────────

fn sync() -> SyncConfig {
    SyncConfig {
        enabled: true,
        poll_interval_secs: 60,
        worker_limit: 4,
        page_size: 100,
        max_pages_per_run: 10,
        retry_base_delay_secs: 5,
        retry_max_delay_secs: 300,
        retry_jitter_secs: 2,
        request_timeout_ms: 30_000,
        connect_timeout_ms: 5_000,
        health_report_interval_secs: 60,
        failure_alert_threshold: 5,
    }
}

fn telemetry(metrics_enabled: bool) -> TelemetryConfig {
    TelemetryConfig {
        metrics: TelemetryMetricsConfig {
            enabled: metrics_enabled,
            bind_address: "0.0.0.0:9464".to_string(),
        },
    }
}

// ── Parameterized helpers (shared structure, varying values) ────

fn repository(user: &str, max_connections: u32) -> RepositoryManagerConfigRaw {
    RepositoryManagerConfigRaw {
        user: user.to_string(),
        password: None,
        database: "astral".to_string(),
        host: "localhost".to_string(),
        port: 3306,
        max_connections,
        min_connections: 1,
    }
}

fn chain(chain_id: u64, name: &str, symbol: &str, eas_endpoint: &str) -> ChainConfigRaw {
    ChainConfigRaw {
        enabled: false,
        chain_id,
        name: name.to_string(),
        symbol: symbol.to_string(),
        eas_endpoint: Some(eas_endpoint.to_string()),
        schema_uid: None,
        deployment_block: 0,
    }
}

// ── Per-environment constructors ────────────────────────────────

fn development() -> ConfigRaw {
    ConfigRaw {
        environment: "development".to_string(),
        logger: LoggerConfig {
            level: "astral_node=debug,astral_repository=debug,astral_eas_client=debug".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: telemetry(true),
        sync: sync(),
        repository: repository("root", 10),
        chains: vec![
            chain(
                11155111,
                "Sepolia",
                "ETH",
                "https://sepolia.easscan.org/graphql",
            ),
            chain(
                84532,
                "Base Sepolia",
                "ETH",
                "https://base-sepolia.easscan.org/graphql",
            ),
        ],
    }
}

fn testnet() -> ConfigRaw {
    ConfigRaw {
        environment: "testnet".to_string(),
        logger: LoggerConfig {
            level: "astral_node=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: telemetry(false),
        sync: sync(),
        repository: repository("root", 50),
        chains: vec![
            chain(
                11155111,
                "Sepolia",
                "ETH",
                "https://sepolia.easscan.org/graphql",
            ),
            chain(
                84532,
                "Base Sepolia",
                "ETH",
                "https://base-sepolia.easscan.org/graphql",
            ),
            chain(
                11155420,
                "Optimism Sepolia",
                "ETH",
                "https://optimism-sepolia.easscan.org/graphql",
            ),
        ],
    }
}

fn mainnet() -> ConfigRaw {
    ConfigRaw {
        environment: "mainnet".to_string(),
        logger: LoggerConfig {
            level: "astral_node=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: telemetry(false),
        sync: sync(),
        repository: repository("root", 120),
        chains: vec![
            chain(1, "Ethereum", "ETH", "https://easscan.org/graphql"),
            chain(8453, "Base", "ETH", "https://base.easscan.org/graphql"),
            chain(10, "Optimism", "ETH", "https://optimism.easscan.org/graphql"),
            chain(
                42161,
                "Arbitrum One",
                "ETH",
                "https://arbitrum.easscan.org/graphql",
            ),
            chain(42220, "Celo", "CELO", "https://celo.easscan.org/graphql"),
        ],
    }
}
