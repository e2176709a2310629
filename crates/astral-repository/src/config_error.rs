use thiserror::Error;

/// Configuration errors for the repository manager.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
