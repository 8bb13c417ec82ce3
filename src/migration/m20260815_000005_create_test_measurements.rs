//! Migration: Create test_measurements table.
//!
//! One row per recorded pass; queried ordered by pass_count ascending.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE test_measurements (
                    id BIGSERIAL PRIMARY KEY,
                    test_run_id UUID NOT NULL REFERENCES test_runs(id) ON DELETE CASCADE,

                    pass_count INTEGER NOT NULL CHECK (pass_count >= 0),
                    rut_depth_mm DOUBLE PRECISION NOT NULL CHECK (rut_depth_mm >= 0),
                    ref_depth_mm DOUBLE PRECISION CHECK (ref_depth_mm >= 0)
                );

                -- Ordered retrieval per run
                CREATE INDEX idx_test_measurements_run_pass
                    ON test_measurements(test_run_id, pass_count);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS test_measurements CASCADE;")
            .await?;

        Ok(())
    }
}
