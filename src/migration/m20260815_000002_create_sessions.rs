//! Migration: Create sessions table.
//!
//! Stores SHA-256 hashes of opaque session cookie tokens.

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
                CREATE TABLE sessions (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    token_hash VARCHAR(64) NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL,
                    revoked_at TIMESTAMPTZ,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Token lookup on every authenticated request
                CREATE UNIQUE INDEX idx_sessions_token_hash ON sessions(token_hash);

                -- Session listing / pruning per user
                CREATE INDEX idx_sessions_user_id ON sessions(user_id);

                -- Lazy pruning of expired sessions
                CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS sessions CASCADE;")
            .await?;

        Ok(())
    }
}
