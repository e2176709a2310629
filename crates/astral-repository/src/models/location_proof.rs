#![allow(unreachable_pub)]

use sea_orm::{
    entity::prelude::{DeriveRelation, EnumIter, Json},
    prelude::{ActiveModelBehavior, DeriveEntityModel, DerivePrimaryKey, PrimaryKeyTrait},
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "location_proof")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Natural key; unique index, upserts key on this column.
    pub attestation_uid: String,
    pub schema_uid: String,
    pub event_timestamp: i64,
    pub expiration_time: Option<i64>,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
    pub ref_uid: Option<String>,
    pub revocable: bool,

    // Geometry: declared SRS + WKT, plus a representative point extracted at
    // translation time so bounding-box queries work on plain SQL columns.
    pub srs: String,
    pub spatial_type: String,
    #[sea_orm(column_type = "Text")]
    pub location_wkt: String,
    pub longitude: f64,
    pub latitude: f64,

    pub recipe_type: Option<String>,
    pub recipe_payload: Option<Json>,
    pub media_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub media_data: Option<String>,
    pub memo: Option<String>,

    pub status: String,
    pub block_number: Option<i64>,
    pub transaction_hash: Option<String>,
    pub cid: Option<String>,

    pub chain_id: i64,
    pub attester_id: i32,
    pub recipient_id: i32,

    /// Unrecognized payload fields preserved verbatim.
    pub extra: Json,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
