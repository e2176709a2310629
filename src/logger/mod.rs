//! Logging and telemetry bootstrap for the attestation sync node.
//!
//! Output is pretty (human-readable) or JSON per configuration. `RUST_LOG`
//! overrides the configured level; without it the node's own crates log at
//! the configured level while chatty dependencies stay at `warn`. The
//! Prometheus exporter is optional, and a failure to bind it never takes the
//! node down.

mod config;

use std::net::SocketAddr;

pub(crate) use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&logger_config.level));

    match logger_config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false))
                .init();
        }
    }

    install_metrics_exporter(&telemetry_config.metrics);
}

/// Filter used when `RUST_LOG` is unset: the configured level globally, with
/// the HTTP and database stacks pinned to `warn` so page fetches and upserts
/// do not drown the sync logs.
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},sqlx=warn,hyper_util=warn,reqwest=warn,h2=warn"))
}

fn install_metrics_exporter(metrics_config: &TelemetryMetricsConfig) {
    if !metrics_config.enabled {
        return;
    }

    let bind_address: SocketAddr = match metrics_config.bind_address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::warn!(
                bind_address = %metrics_config.bind_address,
                %error,
                "Invalid metrics bind address, sync metrics will not be exported"
            );
            return;
        }
    };

    match PrometheusBuilder::new()
        .with_http_listener(bind_address)
        .install()
    {
        Ok(()) => tracing::info!(%bind_address, "Prometheus metrics exporter listening"),
        Err(error) => tracing::warn!(
            %bind_address,
            %error,
            "Prometheus metrics exporter failed to start, continuing without it"
        ),
    }
}
