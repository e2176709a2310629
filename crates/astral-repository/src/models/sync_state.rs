#![allow(unreachable_pub)]

use sea_orm::{
    entity::prelude::{DeriveRelation, EnumIter},
    prelude::{ActiveModelBehavior, DeriveEntityModel, DerivePrimaryKey, PrimaryKeyTrait},
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub chain_id: i64,
    pub schema_uid: String,
    /// Watermark block; null until the first successful batch.
    pub last_synced_block: Option<i64>,
    /// Tie-breaker for records sharing the watermark block.
    pub last_synced_attestation_uid: Option<String>,
    pub last_sync_attempt_at: Option<i64>,
    pub last_sync_success_at: Option<i64>,
    pub consecutive_failure_count: i32,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
