use sea_orm_migration::{
    async_trait::async_trait,
    prelude::{DbErr, DeriveMigrationName, Iden, MigrationTrait, SchemaManager, Table},
    schema::{big_integer, big_integer_null, integer, string, string_null},
    sea_query,
};

#[derive(Iden)]
enum SyncState {
    Table,
    ChainId,
    SchemaUid,
    LastSyncedBlock,
    LastSyncedAttestationUid,
    LastSyncAttemptAt,
    LastSyncSuccessAt,
    ConsecutiveFailureCount,
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
                    .table(SyncState::Table)
                    .if_not_exists()
                    .col(big_integer(SyncState::ChainId).primary_key())
                    .col(string(SyncState::SchemaUid))
                    .col(big_integer_null(SyncState::LastSyncedBlock))
                    .col(string_null(SyncState::LastSyncedAttestationUid))
                    .col(big_integer_null(SyncState::LastSyncAttemptAt))
                    .col(big_integer_null(SyncState::LastSyncSuccessAt))
                    .col(integer(SyncState::ConsecutiveFailureCount).default(0))
                    .col(big_integer(SyncState::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncState::Table).if_exists().to_owned())
            .await
    }
}
