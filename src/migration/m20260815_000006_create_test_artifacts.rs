//! Migration: Create test_artifacts table.
//!
//! Generated files attached to a test result.

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
                CREATE TABLE test_artifacts (
                    id UUID PRIMARY KEY,
                    test_result_id UUID NOT NULL REFERENCES test_results(id) ON DELETE CASCADE,

                    kind VARCHAR(20) NOT NULL
                        CHECK (kind IN ('image', 'video', 'report', 'log')),
                    path VARCHAR(500) NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Artifact browser filters by kind within a result
                CREATE INDEX idx_test_artifacts_result_kind
                    ON test_artifacts(test_result_id, kind);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS test_artifacts CASCADE;")
            .await?;

        Ok(())
    }
}
