//! Migration: Create test_runs table.
//!
//! One row per initiated wheel-tracking test. Status codes follow the
//! analysis lifecycle: PENDING=1, RUNNING=2, COMPLETED=3, FAILED=4.

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
                CREATE TABLE test_runs (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,

                    specimen VARCHAR(255) NOT NULL,
                    binder_grade VARCHAR(100) NOT NULL,
                    file_type VARCHAR(20) NOT NULL
                        CHECK (file_type IN ('csv', 'xlsx', 'json')),
                    allowed_rut_depth DOUBLE PRECISION NOT NULL
                        CHECK (allowed_rut_depth >= 0),
                    notes TEXT,
                    file_path VARCHAR(500) NOT NULL,

                    status SMALLINT NOT NULL DEFAULT 1
                        CHECK (status BETWEEN 1 AND 4),
                    errors TEXT,
                    analysis_version INTEGER NOT NULL DEFAULT 1,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Per-user dashboards filter on status
                CREATE INDEX idx_test_runs_user_status ON test_runs(user_id, status);

                -- Listing by creation date
                CREATE INDEX idx_test_runs_created_at ON test_runs(created_at DESC);

                -- Admin filtering by status across users
                CREATE INDEX idx_test_runs_status ON test_runs(status);

                -- Trigger to update updated_at
                CREATE TRIGGER update_test_runs_updated_at
                    BEFORE UPDATE ON test_runs
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
                DROP TRIGGER IF EXISTS update_test_runs_updated_at ON test_runs;
                DROP TABLE IF EXISTS test_runs CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
