use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Derived lifecycle status of a location proof.
///
/// The status is re-derived from the raw record on every ingestion, so the
/// stored value is always reproducible from the source data. Precedence when
/// deriving (highest wins): revoked > expired > validated > offchain_stored >
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    /// No on-chain or off-chain evidence yet.
    Pending,
    /// Only an off-chain content identifier (IPFS CID) is known.
    OffchainStored,
    /// Recorded on chain (block number and transaction hash present).
    Validated,
    /// Expiration timestamp has passed.
    Expired,
    /// Explicitly revoked by the attester.
    Revoked,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Pending => "pending",
            ProofStatus::OffchainStored => "offchain_stored",
            ProofStatus::Validated => "validated",
            ProofStatus::Expired => "expired",
            ProofStatus::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProofStatus::Pending),
            "offchain_stored" => Ok(ProofStatus::OffchainStored),
            "validated" => Ok(ProofStatus::Validated),
            "expired" => Ok(ProofStatus::Expired),
            "revoked" => Ok(ProofStatus::Revoked),
            other => Err(format!("unknown proof status: {}", other)),
        }
    }
}
