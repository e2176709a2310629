use sea_orm_migration::{
    async_trait::async_trait,
    prelude::{DbErr, DeriveMigrationName, Iden, MigrationTrait, SchemaManager, Table},
    schema::{big_integer, string},
    sea_query,
};

#[derive(Iden)]
enum Chain {
    Table,
    ChainId,
    Name,
    Symbol,
    EasEndpoint,
    SchemaUid,
    DeploymentBlock,
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
                    .table(Chain::Table)
                    .if_not_exists()
                    .col(big_integer(Chain::ChainId).primary_key())
                    .col(string(Chain::Name))
                    .col(string(Chain::Symbol))
                    .col(string(Chain::EasEndpoint))
                    .col(string(Chain::SchemaUid))
                    .col(big_integer(Chain::DeploymentBlock).default(0))
                    .col(big_integer(Chain::CreatedAt))
                    .col(big_integer(Chain::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chain::Table).if_exists().to_owned())
            .await
    }
}
