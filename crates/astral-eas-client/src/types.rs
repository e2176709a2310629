use astral_domain::SyncCursor;
use serde::Deserialize;

/// One attestation record as reported by the remote index.
///
/// Fields the index may omit are explicit options with defaults; values with
/// unexpected types fail deserialization of the whole page rather than being
/// coerced.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawAttestation {
    /// Attestation uid, the natural key.
    pub id: String,
    pub attester: String,
    pub recipient: String,
    #[serde(default)]
    pub revoked: bool,
    /// Unix timestamp of revocation; the index reports 0 when unset.
    #[serde(default)]
    pub revocation_time: Option<i64>,
    /// Unix timestamp of expiry; the index reports 0 when unset.
    #[serde(default)]
    pub expiration_time: Option<i64>,
    #[serde(default = "default_revocable")]
    pub revocable: bool,
    /// Unix timestamp of the attested event.
    pub time: i64,
    /// Schema-encoded payload. Either a JSON object or a JSON-encoded string.
    #[serde(default)]
    pub data: serde_json::Value,
    pub schema_id: String,
    #[serde(default)]
    pub ref_uid: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
    /// IPFS content identifier for off-chain attestations.
    #[serde(default)]
    pub cid: Option<String>,
}

fn default_revocable() -> bool {
    true
}

/// One page of index results, in the index's stable order
/// (block number ascending, then uid).
#[derive(Debug, Clone)]
pub struct AttestationPage {
    pub records: Vec<RawAttestation>,
    /// Position after the last record of this page; `None` when the page is
    /// empty (the caller keeps its previous cursor).
    pub next_cursor: Option<SyncCursor>,
}

impl AttestationPage {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_cursor: None,
        }
    }
}
