use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::{
    error::Result,
    models::address::{ActiveModel, Column, Entity},
};

#[derive(Clone)]
pub struct AddressRepository {
    conn: Arc<DatabaseConnection>,
}

impl AddressRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Resolve an address to its row id, creating the row if missing.
    pub async fn get_or_create(&self, address: &str) -> Result<i32> {
        Self::get_or_create_in(self.conn.as_ref(), address).await
    }

    /// Transaction-friendly variant: generic over the connection so batch
    /// writers can resolve addresses inside their own transaction.
    pub async fn get_or_create_in<C: ConnectionTrait>(conn: &C, address: &str) -> Result<i32> {
        // Hex addresses are case-insensitive; store one canonical form.
        let normalized = address.to_ascii_lowercase();

        if let Some(row) = Entity::find()
            .filter(Column::Address.eq(normalized.as_str()))
            .one(conn)
            .await?
        {
            return Ok(row.id);
        }

        let model = ActiveModel {
            id: ActiveValue::NotSet,
            address: ActiveValue::Set(normalized),
            ens_name: ActiveValue::Set(None),
            display_name: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now().timestamp()),
        };

        let inserted = Entity::insert(model).exec(conn).await?;
        Ok(inserted.last_insert_id)
    }
}
