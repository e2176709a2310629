pub(crate) mod address_repository;
pub(crate) mod chain_repository;
pub(crate) mod location_proof_repository;
pub(crate) mod sync_state_repository;
