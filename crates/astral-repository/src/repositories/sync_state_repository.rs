use std::sync::Arc;

use astral_domain::{AttestationUid, ChainId};
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use crate::{
    error::Result,
    models::sync_state::{ActiveModel, Entity},
    types::SyncStateEntry,
};

#[derive(Clone)]
pub struct SyncStateRepository {
    conn: Arc<DatabaseConnection>,
}

impl SyncStateRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Sync bookkeeping for one chain. None means the chain has never been
    /// attempted; rows are created lazily on the first attempt outcome.
    pub async fn get(&self, chain_id: ChainId) -> Result<Option<SyncStateEntry>> {
        Ok(Entity::find_by_id(chain_id.as_i64())
            .one(self.conn.as_ref())
            .await?
            .map(Self::to_entry))
    }

    pub async fn all(&self) -> Result<Vec<SyncStateEntry>> {
        let rows = Entity::find().all(self.conn.as_ref()).await?;
        Ok(rows.into_iter().map(Self::to_entry).collect())
    }

    /// Record a failed sync attempt. Bumps the consecutive failure count and
    /// the attempt timestamp; the cursor columns are left untouched so a later
    /// retry resumes from the last committed batch.
    ///
    /// Returns the new consecutive failure count.
    pub async fn record_failure(&self, chain_id: ChainId, schema_uid: &str) -> Result<u32> {
        let now = Utc::now().timestamp();

        if let Some(existing) = Entity::find_by_id(chain_id.as_i64())
            .one(self.conn.as_ref())
            .await?
        {
            let failures = existing.consecutive_failure_count.saturating_add(1);
            let update = ActiveModel {
                chain_id: ActiveValue::Unchanged(existing.chain_id),
                schema_uid: ActiveValue::Unchanged(existing.schema_uid),
                last_synced_block: ActiveValue::Unchanged(existing.last_synced_block),
                last_synced_attestation_uid: ActiveValue::Unchanged(
                    existing.last_synced_attestation_uid,
                ),
                last_sync_attempt_at: ActiveValue::Set(Some(now)),
                last_sync_success_at: ActiveValue::Unchanged(existing.last_sync_success_at),
                consecutive_failure_count: ActiveValue::Set(failures),
                updated_at: ActiveValue::Set(now),
            };
            Entity::update(update).exec(self.conn.as_ref()).await?;
            return Ok(failures as u32);
        }

        let insert = ActiveModel {
            chain_id: ActiveValue::Set(chain_id.as_i64()),
            schema_uid: ActiveValue::Set(schema_uid.to_string()),
            last_synced_block: ActiveValue::Set(None),
            last_synced_attestation_uid: ActiveValue::Set(None),
            last_sync_attempt_at: ActiveValue::Set(Some(now)),
            last_sync_success_at: ActiveValue::Set(None),
            consecutive_failure_count: ActiveValue::Set(1),
            updated_at: ActiveValue::Set(now),
        };
        Entity::insert(insert).exec(self.conn.as_ref()).await?;
        Ok(1)
    }

    /// Record a sync attempt that completed without advancing the cursor
    /// (e.g. no new records). Resets the failure streak and stamps success.
    pub async fn mark_success(&self, chain_id: ChainId, schema_uid: &str) -> Result<()> {
        let now = Utc::now().timestamp();

        if let Some(existing) = Entity::find_by_id(chain_id.as_i64())
            .one(self.conn.as_ref())
            .await?
        {
            let update = ActiveModel {
                chain_id: ActiveValue::Unchanged(existing.chain_id),
                schema_uid: ActiveValue::Unchanged(existing.schema_uid),
                last_synced_block: ActiveValue::Unchanged(existing.last_synced_block),
                last_synced_attestation_uid: ActiveValue::Unchanged(
                    existing.last_synced_attestation_uid,
                ),
                last_sync_attempt_at: ActiveValue::Set(Some(now)),
                last_sync_success_at: ActiveValue::Set(Some(now)),
                consecutive_failure_count: ActiveValue::Set(0),
                updated_at: ActiveValue::Set(now),
            };
            Entity::update(update).exec(self.conn.as_ref()).await?;
            return Ok(());
        }

        let insert = ActiveModel {
            chain_id: ActiveValue::Set(chain_id.as_i64()),
            schema_uid: ActiveValue::Set(schema_uid.to_string()),
            last_synced_block: ActiveValue::Set(None),
            last_synced_attestation_uid: ActiveValue::Set(None),
            last_sync_attempt_at: ActiveValue::Set(Some(now)),
            last_sync_success_at: ActiveValue::Set(Some(now)),
            consecutive_failure_count: ActiveValue::Set(0),
            updated_at: ActiveValue::Set(now),
        };
        Entity::insert(insert).exec(self.conn.as_ref()).await?;
        Ok(())
    }

    fn to_entry(model: crate::models::sync_state::Model) -> SyncStateEntry {
        SyncStateEntry {
            chain_id: ChainId::from(model.chain_id as u64),
            schema_uid: model.schema_uid,
            last_synced_block: model.last_synced_block,
            last_synced_attestation_uid: model
                .last_synced_attestation_uid
                .map(AttestationUid::from),
            last_sync_attempt_at: model.last_sync_attempt_at,
            last_sync_success_at: model.last_sync_success_at,
            consecutive_failure_count: model.consecutive_failure_count.max(0) as u32,
            updated_at: model.updated_at,
        }
    }
}
