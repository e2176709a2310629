mod m001_create_chain;
mod m002_create_address;
mod m003_create_location_proof;
mod m004_create_sync_state;

use sea_orm_migration::{MigrationTrait, MigratorTrait, async_trait::async_trait};

pub(crate) struct Migrator;

#[async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_create_chain::Migration),
            Box::new(m002_create_address::Migration),
            Box::new(m003_create_location_proof::Migration),
            Box::new(m004_create_sync_state::Migration),
        ]
    }
}
