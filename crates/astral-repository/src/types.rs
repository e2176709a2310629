use astral_domain::{AttestationUid, ChainId, ProofStatus, SyncCursor};
use serde_json::Value;

/// A configured chain as persisted in the `chain` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRecord {
    pub chain_id: ChainId,
    pub name: String,
    pub symbol: String,
    pub eas_endpoint: String,
    pub schema_uid: String,
    pub deployment_block: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-chain sync bookkeeping row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStateEntry {
    pub chain_id: ChainId,
    pub schema_uid: String,
    pub last_synced_block: Option<i64>,
    pub last_synced_attestation_uid: Option<AttestationUid>,
    pub last_sync_attempt_at: Option<i64>,
    pub last_sync_success_at: Option<i64>,
    pub consecutive_failure_count: u32,
    pub updated_at: i64,
}

impl SyncStateEntry {
    /// The resume cursor, if a batch has ever been committed for this chain.
    pub fn cursor(&self) -> Option<SyncCursor> {
        self.last_synced_block.map(|block| SyncCursor {
            block_number: block as u64,
            last_uid: self.last_synced_attestation_uid.clone(),
        })
    }
}

/// A fully translated location proof, ready to be persisted.
///
/// Produced by the translation layer; the repository resolves attester and
/// recipient addresses to `address` rows when writing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocationProof {
    pub attestation_uid: AttestationUid,
    pub schema_uid: String,
    pub event_timestamp: i64,
    pub expiration_time: Option<i64>,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
    pub ref_uid: Option<String>,
    pub revocable: bool,

    pub srs: String,
    pub spatial_type: String,
    pub location_wkt: String,
    pub longitude: f64,
    pub latitude: f64,

    pub recipe_type: Option<String>,
    pub recipe_payload: Option<Value>,
    pub media_type: Option<String>,
    pub media_data: Option<String>,
    pub memo: Option<String>,

    pub status: ProofStatus,
    pub block_number: Option<i64>,
    pub transaction_hash: Option<String>,
    pub cid: Option<String>,

    pub chain_id: ChainId,
    pub attester: String,
    pub recipient: String,

    /// Unrecognized payload fields, preserved verbatim.
    pub extra: Value,
}

/// A persisted location proof with addresses resolved back to hex strings.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationProofEntry {
    pub attestation_uid: AttestationUid,
    pub schema_uid: String,
    pub event_timestamp: i64,
    pub expiration_time: Option<i64>,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
    pub ref_uid: Option<String>,
    pub revocable: bool,

    pub srs: String,
    pub spatial_type: String,
    pub location_wkt: String,
    pub longitude: f64,
    pub latitude: f64,

    pub recipe_type: Option<String>,
    pub recipe_payload: Option<Value>,
    pub media_type: Option<String>,
    pub media_data: Option<String>,
    pub memo: Option<String>,

    pub status: ProofStatus,
    pub block_number: Option<i64>,
    pub transaction_hash: Option<String>,
    pub cid: Option<String>,

    pub chain_id: ChainId,
    pub attester: String,
    pub recipient: String,

    pub extra: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Outcome of a committed persistence batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Rows written (inserted or refreshed) in this batch.
    pub upserted: u64,
}
