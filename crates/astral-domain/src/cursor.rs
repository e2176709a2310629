use serde::{Deserialize, Serialize};

use crate::AttestationUid;

/// Ingestion position for one chain.
///
/// `block_number` is the watermark: everything at or before it has been
/// ingested. `last_uid` is the tie-breaker for records sharing that block, so
/// a resume query starting at the same block can drop the already-ingested
/// boundary record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncCursor {
    pub block_number: u64,
    pub last_uid: Option<AttestationUid>,
}

impl SyncCursor {
    /// Cursor for a chain that has never synced: the configured deployment
    /// start point, with no boundary record to skip.
    pub fn from_start(deployment_block: u64) -> Self {
        Self {
            block_number: deployment_block,
            last_uid: None,
        }
    }

    pub fn advanced_to(block_number: u64, last_uid: AttestationUid) -> Self {
        Self {
            block_number,
            last_uid: Some(last_uid),
        }
    }
}

impl std::fmt::Display for SyncCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.last_uid {
            Some(uid) => write!(f, "{}@{}", self.block_number, uid),
            None => write!(f, "{}", self.block_number),
        }
    }
}
