//! Migration: Create test_results table.
//!
//! Aggregated results per run. The unique index on test_run_id makes the
//! intended one-to-one relationship explicit. Classification codes:
//! EXCELLENT=1, GOOD=2, FAIR=3, POOR=4.

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
                CREATE TABLE test_results (
                    id UUID PRIMARY KEY,
                    test_run_id UUID NOT NULL REFERENCES test_runs(id) ON DELETE CASCADE,

                    passes_total BIGINT NOT NULL CHECK (passes_total >= 0),

                    -- Rut depth at fixed pass milestones (mm)
                    rut_depth_5000 DOUBLE PRECISION NOT NULL CHECK (rut_depth_5000 >= 0),
                    rut_depth_10000 DOUBLE PRECISION NOT NULL CHECK (rut_depth_10000 >= 0),
                    rut_depth_15000 DOUBLE PRECISION NOT NULL CHECK (rut_depth_15000 >= 0),
                    rut_depth_20000 DOUBLE PRECISION NOT NULL CHECK (rut_depth_20000 >= 0),
                    rut_depth_final DOUBLE PRECISION CHECK (rut_depth_final >= 0),

                    passes_to_failure DOUBLE PRECISION CHECK (passes_to_failure >= 0),
                    inflection_pass BIGINT CHECK (inflection_pass >= 0),

                    test_duration_ms BIGINT NOT NULL CHECK (test_duration_ms >= 0),
                    rating DOUBLE PRECISION NOT NULL,
                    rating_classification SMALLINT NOT NULL
                        CHECK (rating_classification BETWEEN 1 AND 4),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- One result per run
                CREATE UNIQUE INDEX idx_test_results_test_run_id ON test_results(test_run_id);

                -- Admin filtering by classification
                CREATE INDEX idx_test_results_rating_classification
                    ON test_results(rating_classification);

                -- Trigger to update updated_at
                CREATE TRIGGER update_test_results_updated_at
                    BEFORE UPDATE ON test_results
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_test_results_updated_at ON test_results;
                DROP TABLE IF EXISTS test_results CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
