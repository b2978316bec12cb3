pub use sea_orm_migration::prelude::*;

mod m20260601_000001_users;
mod m20260601_000002_accounts;
mod m20260601_000003_entries;
mod m20260601_000004_transfers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_users::Migration),
            Box::new(m20260601_000002_accounts::Migration),
            Box::new(m20260601_000003_entries::Migration),
            Box::new(m20260601_000004_transfers::Migration),
        ]
    }
}
