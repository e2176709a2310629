pub(crate) mod address;
pub(crate) mod chain;
pub(crate) mod location_proof;
pub(crate) mod sync_state;
