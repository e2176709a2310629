use thiserror::Error;

/// Error types for attestation index queries.
///
/// A page either fully parses or the whole call fails with one of these;
/// there is no partial success.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure: connection reset, DNS, timeout.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The index answered but reported GraphQL-level errors.
    #[error("Index returned errors: {0}")]
    GraphQl(String),

    /// The index answered with a payload we could not parse.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Convenient Result type alias for ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
