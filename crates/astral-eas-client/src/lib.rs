mod client;
mod error;
mod types;

pub use client::{AttestationIndex, EasClientConfig, EasIndexClient};
pub use error::{ClientError, Result};
pub use types::{AttestationPage, RawAttestation};
