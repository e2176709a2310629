use serde::{Deserialize, Serialize};

/// Unique identifier of an attestation in the remote index.
///
/// A 32-byte hex string ("0x" + 64 hex chars). Globally unique regardless of
/// chain; used as the natural key for upserts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AttestationUid(String);

impl AttestationUid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttestationUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AttestationUid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AttestationUid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
