#![allow(clippy::unwrap_used)]

use astral_domain::{AttestationUid, ChainId, ProofStatus, SyncCursor};
use serde_json::json;

use crate::{
    BoundingBox, LocationProofFilter, RepositoryManager,
    types::NewLocationProof,
};

async fn manager() -> RepositoryManager {
    RepositoryManager::connect_url("sqlite::memory:").await.unwrap()
}

const SCHEMA_UID: &str = "0xschema";

fn proof(uid: &str, chain_id: u64, block: i64) -> NewLocationProof {
    NewLocationProof {
        attestation_uid: AttestationUid::from(uid),
        schema_uid: SCHEMA_UID.to_string(),
        event_timestamp: 1_700_000_000,
        expiration_time: None,
        revoked: false,
        revocation_time: None,
        ref_uid: None,
        revocable: true,
        srs: "EPSG:4326".to_string(),
        spatial_type: "Point".to_string(),
        location_wkt: "POINT(13.4 52.5)".to_string(),
        longitude: 13.4,
        latitude: 52.5,
        recipe_type: None,
        recipe_payload: None,
        media_type: None,
        media_data: None,
        memo: None,
        status: ProofStatus::Validated,
        block_number: Some(block),
        transaction_hash: Some(format!("0xtx-{uid}")),
        cid: None,
        chain_id: ChainId::from(chain_id),
        attester: "0xAbCd000000000000000000000000000000000001".to_string(),
        recipient: "0x0000000000000000000000000000000000000002".to_string(),
        extra: json!({}),
    }
}

#[tokio::test]
async fn upsert_by_uid_is_idempotent() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let chain_id = ChainId::from(11155111);

    let first = proof("0xaaa", 11155111, 100);
    let cursor = SyncCursor::advanced_to(100, first.attestation_uid.clone());
    repo.persist_batch(chain_id, SCHEMA_UID, &[first.clone()], &cursor)
        .await
        .unwrap();

    // Re-ingest the same record, now revoked.
    let mut second = first;
    second.revoked = true;
    second.revocation_time = Some(1_700_000_500);
    second.status = ProofStatus::Revoked;
    repo.persist_batch(chain_id, SCHEMA_UID, &[second.clone()], &cursor)
        .await
        .unwrap();

    assert_eq!(repo.count(None).await.unwrap(), 1);

    let stored = repo
        .get_by_uid(&second.attestation_uid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ProofStatus::Revoked);
    assert!(stored.revoked);
    assert_eq!(stored.revocation_time, Some(1_700_000_500));
}

#[tokio::test]
async fn persist_batch_advances_cursor_with_the_rows() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let states = manager.sync_state_repository();
    let chain_id = ChainId::from(42220);

    let batch = [proof("0xb1", 42220, 10), proof("0xb2", 42220, 12)];
    let cursor = SyncCursor::advanced_to(12, AttestationUid::from("0xb2"));
    let summary = repo
        .persist_batch(chain_id, SCHEMA_UID, &batch, &cursor)
        .await
        .unwrap();
    assert_eq!(summary.upserted, 2);

    let state = states.get(chain_id).await.unwrap().unwrap();
    assert_eq!(state.cursor().unwrap(), cursor);
    assert_eq!(state.consecutive_failure_count, 0);
    assert!(state.last_sync_success_at.is_some());
}

#[tokio::test]
async fn record_failure_never_moves_the_cursor() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let states = manager.sync_state_repository();
    let chain_id = ChainId::from(1);

    let cursor = SyncCursor::advanced_to(50, AttestationUid::from("0xc1"));
    repo.persist_batch(chain_id, SCHEMA_UID, &[proof("0xc1", 1, 50)], &cursor)
        .await
        .unwrap();

    assert_eq!(states.record_failure(chain_id, SCHEMA_UID).await.unwrap(), 1);
    assert_eq!(states.record_failure(chain_id, SCHEMA_UID).await.unwrap(), 2);

    let state = states.get(chain_id).await.unwrap().unwrap();
    assert_eq!(state.consecutive_failure_count, 2);
    assert_eq!(state.cursor().unwrap(), cursor);
}

#[tokio::test]
async fn failure_on_a_fresh_chain_creates_state_without_a_cursor() {
    let manager = manager().await;
    let states = manager.sync_state_repository();
    let chain_id = ChainId::from(8453);

    assert!(states.get(chain_id).await.unwrap().is_none());
    assert_eq!(states.record_failure(chain_id, SCHEMA_UID).await.unwrap(), 1);

    let state = states.get(chain_id).await.unwrap().unwrap();
    assert!(state.cursor().is_none());
    assert!(state.last_sync_success_at.is_none());
}

#[tokio::test]
async fn mark_success_resets_failures_and_keeps_the_cursor() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let states = manager.sync_state_repository();
    let chain_id = ChainId::from(10);

    let cursor = SyncCursor::advanced_to(7, AttestationUid::from("0xd1"));
    repo.persist_batch(chain_id, SCHEMA_UID, &[proof("0xd1", 10, 7)], &cursor)
        .await
        .unwrap();
    states.record_failure(chain_id, SCHEMA_UID).await.unwrap();

    states.mark_success(chain_id, SCHEMA_UID).await.unwrap();

    let state = states.get(chain_id).await.unwrap().unwrap();
    assert_eq!(state.consecutive_failure_count, 0);
    assert_eq!(state.cursor().unwrap(), cursor);
}

#[tokio::test]
async fn query_applies_chain_status_and_bbox_filters() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let chain_a = ChainId::from(1);
    let chain_b = ChainId::from(42220);

    let mut berlin = proof("0xe1", 1, 1);
    berlin.longitude = 13.4;
    berlin.latitude = 52.5;

    let mut nairobi = proof("0xe2", 1, 2);
    nairobi.longitude = 36.8;
    nairobi.latitude = -1.3;
    nairobi.location_wkt = "POINT(36.8 -1.3)".to_string();

    let mut pending_elsewhere = proof("0xe3", 42220, 3);
    pending_elsewhere.status = ProofStatus::Pending;
    pending_elsewhere.block_number = None;
    pending_elsewhere.transaction_hash = None;
    pending_elsewhere.longitude = -74.0;
    pending_elsewhere.latitude = 40.7;
    pending_elsewhere.location_wkt = "POINT(-74.0 40.7)".to_string();

    let cursor_a = SyncCursor::advanced_to(2, AttestationUid::from("0xe2"));
    repo.persist_batch(chain_a, SCHEMA_UID, &[berlin, nairobi], &cursor_a)
        .await
        .unwrap();
    let cursor_b = SyncCursor::advanced_to(3, AttestationUid::from("0xe3"));
    repo.persist_batch(chain_b, SCHEMA_UID, &[pending_elsewhere], &cursor_b)
        .await
        .unwrap();

    let by_chain = repo
        .query(&LocationProofFilter {
            chain_id: Some(chain_a),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_chain.len(), 2);

    let by_status = repo
        .query(&LocationProofFilter {
            status: Some(ProofStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].attestation_uid.as_str(), "0xe3");

    // Window around Europe catches Berlin only.
    let by_bbox = repo
        .query(&LocationProofFilter {
            bbox: Some(BoundingBox {
                min_lon: -10.0,
                min_lat: 35.0,
                max_lon: 30.0,
                max_lat: 70.0,
            }),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_bbox.len(), 1);
    assert_eq!(by_bbox[0].attestation_uid.as_str(), "0xe1");

    let limited = repo
        .query(&LocationProofFilter {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn addresses_are_normalized_and_shared_across_proofs() {
    let manager = manager().await;
    let repo = manager.location_proof_repository();
    let addresses = manager.address_repository();
    let chain_id = ChainId::from(1);

    let mut a = proof("0xf1", 1, 1);
    a.attester = "0xABCD000000000000000000000000000000000099".to_string();
    let mut b = proof("0xf2", 1, 2);
    b.attester = "0xabcd000000000000000000000000000000000099".to_string();

    let cursor = SyncCursor::advanced_to(2, AttestationUid::from("0xf2"));
    repo.persist_batch(chain_id, SCHEMA_UID, &[a, b], &cursor)
        .await
        .unwrap();

    // Mixed-case and lowercase forms resolve to the same row.
    let id_upper = addresses
        .get_or_create("0xABCD000000000000000000000000000000000099")
        .await
        .unwrap();
    let id_lower = addresses
        .get_or_create("0xabcd000000000000000000000000000000000099")
        .await
        .unwrap();
    assert_eq!(id_upper, id_lower);

    let stored = repo
        .get_by_uid(&AttestationUid::from("0xf1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.attester,
        "0xabcd000000000000000000000000000000000099"
    );
}

#[tokio::test]
async fn chain_upsert_refreshes_configuration() {
    let manager = manager().await;
    let chains = manager.chain_repository();
    let chain_id = ChainId::from(11155111);

    chains
        .upsert_chain(
            chain_id,
            "Sepolia",
            "ETH",
            "https://sepolia.easscan.org/graphql",
            SCHEMA_UID,
            0,
        )
        .await
        .unwrap();
    chains
        .upsert_chain(
            chain_id,
            "Sepolia",
            "ETH",
            "https://sepolia.easscan.org/graphql",
            SCHEMA_UID,
            4_500_000,
        )
        .await
        .unwrap();

    let all = chains.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].deployment_block, 4_500_000);
}
