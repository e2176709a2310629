use sea_orm_migration::{
    async_trait::async_trait,
    prelude::{
        ColumnDef, DbErr, DeriveMigrationName, Iden, Index, MigrationTrait, SchemaManager, Table,
    },
    schema::{
        big_integer, big_integer_null, boolean, double, integer, json, json_null, string,
        string_null, text, text_null,
    },
    sea_query,
};

#[derive(Iden)]
enum LocationProof {
    Table,
    Id,
    AttestationUid,
    SchemaUid,
    EventTimestamp,
    ExpirationTime,
    Revoked,
    RevocationTime,
    RefUid,
    Revocable,
    Srs,
    SpatialType,
    LocationWkt,
    Longitude,
    Latitude,
    RecipeType,
    RecipePayload,
    MediaType,
    MediaData,
    Memo,
    Status,
    BlockNumber,
    TransactionHash,
    Cid,
    ChainId,
    AttesterId,
    RecipientId,
    Extra,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LocationProof::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LocationProof::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(LocationProof::AttestationUid))
                    .col(string(LocationProof::SchemaUid))
                    .col(big_integer(LocationProof::EventTimestamp))
                    .col(big_integer_null(LocationProof::ExpirationTime))
                    .col(boolean(LocationProof::Revoked).default(false))
                    .col(big_integer_null(LocationProof::RevocationTime))
                    .col(string_null(LocationProof::RefUid))
                    .col(boolean(LocationProof::Revocable).default(true))
                    .col(string(LocationProof::Srs))
                    .col(string(LocationProof::SpatialType))
                    .col(text(LocationProof::LocationWkt))
                    .col(double(LocationProof::Longitude))
                    .col(double(LocationProof::Latitude))
                    .col(string_null(LocationProof::RecipeType))
                    .col(json_null(LocationProof::RecipePayload))
                    .col(string_null(LocationProof::MediaType))
                    .col(text_null(LocationProof::MediaData))
                    .col(string_null(LocationProof::Memo))
                    .col(string(LocationProof::Status))
                    .col(big_integer_null(LocationProof::BlockNumber))
                    .col(string_null(LocationProof::TransactionHash))
                    .col(string_null(LocationProof::Cid))
                    .col(big_integer(LocationProof::ChainId))
                    .col(integer(LocationProof::AttesterId))
                    .col(integer(LocationProof::RecipientId))
                    .col(json(LocationProof::Extra))
                    .col(big_integer(LocationProof::CreatedAt))
                    .col(big_integer(LocationProof::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Natural key for upserts.
        manager
            .create_index(
                Index::create()
                    .name("idx_location_proof_attestation_uid")
                    .table(LocationProof::Table)
                    .col(LocationProof::AttestationUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Read-side filters: chain, status, time range.
        manager
            .create_index(
                Index::create()
                    .name("idx_location_proof_chain_id")
                    .table(LocationProof::Table)
                    .col(LocationProof::ChainId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_proof_status")
                    .table(LocationProof::Table)
                    .col(LocationProof::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_proof_event_timestamp")
                    .table(LocationProof::Table)
                    .col(LocationProof::EventTimestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(LocationProof::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
