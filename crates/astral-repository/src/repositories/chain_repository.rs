use std::sync::Arc;

use astral_domain::ChainId;
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use crate::{
    error::Result,
    models::chain::{ActiveModel, Column, Entity},
    types::ChainRecord,
};

#[derive(Clone)]
pub struct ChainRepository {
    conn: Arc<DatabaseConnection>,
}

impl ChainRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Insert or refresh a configured chain. Configuration is the source of
    /// truth, so everything except the id and created_at is overwritten.
    pub async fn upsert_chain(
        &self,
        chain_id: ChainId,
        name: &str,
        symbol: &str,
        eas_endpoint: &str,
        schema_uid: &str,
        deployment_block: u64,
    ) -> Result<()> {
        let now = Utc::now().timestamp();

        let model = ActiveModel {
            chain_id: ActiveValue::Set(chain_id.as_i64()),
            name: ActiveValue::Set(name.to_string()),
            symbol: ActiveValue::Set(symbol.to_string()),
            eas_endpoint: ActiveValue::Set(eas_endpoint.to_string()),
            schema_uid: ActiveValue::Set(schema_uid.to_string()),
            deployment_block: ActiveValue::Set(deployment_block as i64),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(Column::ChainId)
                    .update_columns([
                        Column::Name,
                        Column::Symbol,
                        Column::EasEndpoint,
                        Column::SchemaUid,
                        Column::DeploymentBlock,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.conn.as_ref())
            .await?;

        Ok(())
    }

    pub async fn get(&self, chain_id: ChainId) -> Result<Option<ChainRecord>> {
        Ok(Entity::find_by_id(chain_id.as_i64())
            .one(self.conn.as_ref())
            .await?
            .map(Self::to_record))
    }

    pub async fn all(&self) -> Result<Vec<ChainRecord>> {
        let rows = Entity::find().all(self.conn.as_ref()).await?;
        Ok(rows.into_iter().map(Self::to_record).collect())
    }

    fn to_record(model: crate::models::chain::Model) -> ChainRecord {
        ChainRecord {
            chain_id: ChainId::from(model.chain_id as u64),
            name: model.name,
            symbol: model.symbol,
            eas_endpoint: model.eas_endpoint,
            schema_uid: model.schema_uid,
            deployment_block: model.deployment_block as u64,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
