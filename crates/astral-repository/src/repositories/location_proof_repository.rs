use std::{collections::HashMap, str::FromStr, sync::Arc};

use astral_domain::{AttestationUid, ChainId, ProofStatus, SyncCursor};
use chrono::Utc;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionError, TransactionTrait,
};

use crate::{
    error::{RepositoryError, Result},
    models::{
        address::{Column as AddressColumn, Entity as AddressEntity},
        location_proof::{
            ActiveModel as ProofActiveModel, Column as ProofColumn, Entity as ProofEntity,
            Model as ProofModel,
        },
        sync_state::{ActiveModel as StateActiveModel, Column as StateColumn, Entity as StateEntity},
    },
    repositories::address_repository::AddressRepository,
    types::{BatchSummary, LocationProofEntry, NewLocationProof},
};

/// Geographic window in EPSG:4326 degrees, applied to the representative
/// point of each proof.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LocationProofFilter {
    pub chain_id: Option<ChainId>,
    pub status: Option<ProofStatus>,
    pub bbox: Option<BoundingBox>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Clone)]
pub struct LocationProofRepository {
    conn: Arc<DatabaseConnection>,
}

impl LocationProofRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Persist one translated batch and advance the chain's cursor, all in a
    /// single transaction. Either every row lands and the watermark moves, or
    /// nothing changes.
    ///
    /// Rows are keyed on `attestation_uid`, so re-ingesting a record refreshes
    /// its mutable fields instead of duplicating it.
    pub async fn persist_batch(
        &self,
        chain_id: ChainId,
        schema_uid: &str,
        proofs: &[NewLocationProof],
        cursor: &SyncCursor,
    ) -> Result<BatchSummary> {
        let proofs = proofs.to_vec();
        let cursor = cursor.clone();
        let schema_uid = schema_uid.to_string();

        let summary = self
            .conn
            .transaction::<_, BatchSummary, RepositoryError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now().timestamp();
                    let mut upserted = 0u64;

                    for proof in &proofs {
                        let attester_id =
                            AddressRepository::get_or_create_in(txn, &proof.attester).await?;
                        let recipient_id =
                            AddressRepository::get_or_create_in(txn, &proof.recipient).await?;

                        let model =
                            Self::to_active_model(proof, attester_id, recipient_id, now);

                        ProofEntity::insert(model)
                            .on_conflict(
                                sea_orm::sea_query::OnConflict::column(
                                    ProofColumn::AttestationUid,
                                )
                                .update_columns([
                                    ProofColumn::Revoked,
                                    ProofColumn::RevocationTime,
                                    ProofColumn::ExpirationTime,
                                    ProofColumn::Status,
                                    ProofColumn::BlockNumber,
                                    ProofColumn::TransactionHash,
                                    ProofColumn::Cid,
                                    ProofColumn::UpdatedAt,
                                ])
                                .to_owned(),
                            )
                            .exec(txn)
                            .await?;
                        upserted += 1;
                    }

                    Self::advance_watermark(txn, chain_id, &schema_uid, &cursor, now).await?;

                    Ok(BatchSummary { upserted })
                })
            })
            .await
            .map_err(|err| match err {
                TransactionError::Connection(db) => RepositoryError::Database(db),
                TransactionError::Transaction(inner) => inner,
            })?;

        Ok(summary)
    }

    pub async fn get_by_uid(&self, uid: &AttestationUid) -> Result<Option<LocationProofEntry>> {
        let row = ProofEntity::find()
            .filter(ProofColumn::AttestationUid.eq(uid.as_str()))
            .one(self.conn.as_ref())
            .await?;

        match row {
            Some(model) => {
                let addresses = self.load_addresses(std::slice::from_ref(&model)).await?;
                Ok(Some(Self::to_entry(model, &addresses)?))
            }
            None => Ok(None),
        }
    }

    pub async fn query(&self, filter: &LocationProofFilter) -> Result<Vec<LocationProofEntry>> {
        let mut select = ProofEntity::find();

        if let Some(chain_id) = filter.chain_id {
            select = select.filter(ProofColumn::ChainId.eq(chain_id.as_i64()));
        }
        if let Some(status) = filter.status {
            select = select.filter(ProofColumn::Status.eq(status.as_str()));
        }
        if let Some(bbox) = &filter.bbox {
            select = select
                .filter(ProofColumn::Longitude.gte(bbox.min_lon))
                .filter(ProofColumn::Longitude.lte(bbox.max_lon))
                .filter(ProofColumn::Latitude.gte(bbox.min_lat))
                .filter(ProofColumn::Latitude.lte(bbox.max_lat));
        }
        if let Some(from) = filter.from_timestamp {
            select = select.filter(ProofColumn::EventTimestamp.gte(from));
        }
        if let Some(to) = filter.to_timestamp {
            select = select.filter(ProofColumn::EventTimestamp.lte(to));
        }

        select = select.order_by_desc(ProofColumn::EventTimestamp);

        if let Some(limit) = filter.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = filter.offset {
            select = select.offset(offset);
        }

        let rows = select.all(self.conn.as_ref()).await?;
        let addresses = self.load_addresses(&rows).await?;

        rows.into_iter()
            .map(|model| Self::to_entry(model, &addresses))
            .collect()
    }

    pub async fn count(&self, chain_id: Option<ChainId>) -> Result<u64> {
        let mut select = ProofEntity::find();
        if let Some(chain_id) = chain_id {
            select = select.filter(ProofColumn::ChainId.eq(chain_id.as_i64()));
        }
        Ok(select.count(self.conn.as_ref()).await?)
    }

    async fn advance_watermark<C: ConnectionTrait>(
        conn: &C,
        chain_id: ChainId,
        schema_uid: &str,
        cursor: &SyncCursor,
        now: i64,
    ) -> Result<()> {
        let model = StateActiveModel {
            chain_id: ActiveValue::Set(chain_id.as_i64()),
            schema_uid: ActiveValue::Set(schema_uid.to_string()),
            last_synced_block: ActiveValue::Set(Some(cursor.block_number as i64)),
            last_synced_attestation_uid: ActiveValue::Set(
                cursor.last_uid.as_ref().map(|uid| uid.as_str().to_string()),
            ),
            last_sync_attempt_at: ActiveValue::Set(Some(now)),
            last_sync_success_at: ActiveValue::Set(Some(now)),
            consecutive_failure_count: ActiveValue::Set(0),
            updated_at: ActiveValue::Set(now),
        };

        StateEntity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(StateColumn::ChainId)
                    .update_columns([
                        StateColumn::SchemaUid,
                        StateColumn::LastSyncedBlock,
                        StateColumn::LastSyncedAttestationUid,
                        StateColumn::LastSyncAttemptAt,
                        StateColumn::LastSyncSuccessAt,
                        StateColumn::ConsecutiveFailureCount,
                        StateColumn::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;

        Ok(())
    }

    async fn load_addresses(&self, rows: &[ProofModel]) -> Result<HashMap<i32, String>> {
        let mut ids: Vec<i32> = rows
            .iter()
            .flat_map(|row| [row.attester_id, row.recipient_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let addresses = AddressEntity::find()
            .filter(AddressColumn::Id.is_in(ids))
            .all(self.conn.as_ref())
            .await?;

        Ok(addresses
            .into_iter()
            .map(|row| (row.id, row.address))
            .collect())
    }

    fn to_active_model(
        proof: &NewLocationProof,
        attester_id: i32,
        recipient_id: i32,
        now: i64,
    ) -> ProofActiveModel {
        ProofActiveModel {
            id: ActiveValue::NotSet,
            attestation_uid: ActiveValue::Set(proof.attestation_uid.as_str().to_string()),
            schema_uid: ActiveValue::Set(proof.schema_uid.clone()),
            event_timestamp: ActiveValue::Set(proof.event_timestamp),
            expiration_time: ActiveValue::Set(proof.expiration_time),
            revoked: ActiveValue::Set(proof.revoked),
            revocation_time: ActiveValue::Set(proof.revocation_time),
            ref_uid: ActiveValue::Set(proof.ref_uid.clone()),
            revocable: ActiveValue::Set(proof.revocable),
            srs: ActiveValue::Set(proof.srs.clone()),
            spatial_type: ActiveValue::Set(proof.spatial_type.clone()),
            location_wkt: ActiveValue::Set(proof.location_wkt.clone()),
            longitude: ActiveValue::Set(proof.longitude),
            latitude: ActiveValue::Set(proof.latitude),
            recipe_type: ActiveValue::Set(proof.recipe_type.clone()),
            recipe_payload: ActiveValue::Set(proof.recipe_payload.clone()),
            media_type: ActiveValue::Set(proof.media_type.clone()),
            media_data: ActiveValue::Set(proof.media_data.clone()),
            memo: ActiveValue::Set(proof.memo.clone()),
            status: ActiveValue::Set(proof.status.as_str().to_string()),
            block_number: ActiveValue::Set(proof.block_number),
            transaction_hash: ActiveValue::Set(proof.transaction_hash.clone()),
            cid: ActiveValue::Set(proof.cid.clone()),
            chain_id: ActiveValue::Set(proof.chain_id.as_i64()),
            attester_id: ActiveValue::Set(attester_id),
            recipient_id: ActiveValue::Set(recipient_id),
            extra: ActiveValue::Set(proof.extra.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }

    fn to_entry(
        model: ProofModel,
        addresses: &HashMap<i32, String>,
    ) -> Result<LocationProofEntry> {
        let status = ProofStatus::from_str(&model.status).map_err(RepositoryError::InvalidValue)?;

        let attester = addresses
            .get(&model.attester_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("address id {}", model.attester_id)))?;
        let recipient = addresses
            .get(&model.recipient_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("address id {}", model.recipient_id))
            })?;

        Ok(LocationProofEntry {
            attestation_uid: AttestationUid::from(model.attestation_uid),
            schema_uid: model.schema_uid,
            event_timestamp: model.event_timestamp,
            expiration_time: model.expiration_time,
            revoked: model.revoked,
            revocation_time: model.revocation_time,
            ref_uid: model.ref_uid,
            revocable: model.revocable,
            srs: model.srs,
            spatial_type: model.spatial_type,
            location_wkt: model.location_wkt,
            longitude: model.longitude,
            latitude: model.latitude,
            recipe_type: model.recipe_type,
            recipe_payload: model.recipe_payload,
            media_type: model.media_type,
            media_data: model.media_data,
            memo: model.memo,
            status,
            block_number: model.block_number,
            transaction_hash: model.transaction_hash,
            cid: model.cid,
            chain_id: ChainId::from(model.chain_id as u64),
            attester,
            recipient,
            extra: model.extra,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
