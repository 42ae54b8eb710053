//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261019_000001_create_build_results;
mod m20261019_000002_create_test_case_results;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_build_results::Migration),
            Box::new(m20261019_000002_create_test_case_results::Migration),
        ]
    }
}
