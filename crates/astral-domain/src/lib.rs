mod chain_id;
mod cursor;
mod status;
mod uid;

pub use chain_id::ChainId;
pub use cursor::SyncCursor;
pub use status::ProofStatus;
pub use uid::AttestationUid;
