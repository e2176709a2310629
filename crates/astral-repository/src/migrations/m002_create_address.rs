use sea_orm_migration::{
    async_trait::async_trait,
    prelude::{DbErr, DeriveMigrationName, Iden, Index, MigrationTrait, SchemaManager, Table},
    schema::{big_integer, pk_auto, string, string_null},
    sea_query,
};

#[derive(Iden)]
enum Address {
    Table,
    Id,
    #[iden = "address"]
    AddressValue,
    EnsName,
    DisplayName,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Address::Table)
                    .if_not_exists()
                    .col(pk_auto(Address::Id))
                    .col(string(Address::AddressValue))
                    .col(string_null(Address::EnsName))
                    .col(string_null(Address::DisplayName))
                    .col(big_integer(Address::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_address_address")
                    .table(Address::Table)
                    .col(Address::AddressValue)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Address::Table).if_exists().to_owned())
            .await
    }
}
