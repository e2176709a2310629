use serde::{Deserialize, Serialize};

/// Unique identifier for a blockchain network.
///
/// This is the EIP-155 chain id (e.g. 1 for Ethereum mainnet, 11155111 for
/// Sepolia, 42220 for Celo).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Signed form for database columns.
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
