use thiserror::Error;

/// Top-level application error that composes all subsystem errors
#[derive(Error, Debug)]
pub(crate) enum NodeError {
    /// Attestation index (GraphQL) errors
    #[error("Attestation index error: {0}")]
    Client(#[from] astral_eas_client::ClientError),

    /// Database/repository errors
    #[error("Repository error: {0}")]
    Repository(#[from] astral_repository::error::RepositoryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
