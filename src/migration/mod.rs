//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260815_000001_create_users;
mod m20260815_000002_create_sessions;
mod m20260815_000003_create_test_runs;
mod m20260815_000004_create_test_results;
mod m20260815_000005_create_test_measurements;
mod m20260815_000006_create_test_artifacts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_000001_create_users::Migration),
            Box::new(m20260815_000002_create_sessions::Migration),
            Box::new(m20260815_000003_create_test_runs::Migration),
            Box::new(m20260815_000004_create_test_results::Migration),
            Box::new(m20260815_000005_create_test_measurements::Migration),
            Box::new(m20260815_000006_create_test_artifacts::Migration),
        ]
    }
}
