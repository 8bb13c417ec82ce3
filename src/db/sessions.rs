//! Database operations for sessions.

use chrono::Utc;
use sea_orm::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entity::session::{self, Entity as Session};
use crate::error::{AppError, AppResult};

/// Hash a session token using SHA-256. Only the hash is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random opaque session token string.
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("hwtt_sess_{}", hex::encode(random_bytes))
}

/// Insert a new session (stores the hash, not the raw token).
pub async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    token_hash: &str,
    ttl_secs: u64,
) -> AppResult<()> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(ttl_secs as i64);

    let model = session::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        token_hash: Set(token_hash.to_string()),
        expires_at: Set(expires_at),
        revoked_at: Set(None),
        created_at: Set(now),
    };

    Session::insert(model)
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert session: {}", e)))?;

    Ok(())
}

/// Find an active (non-revoked, non-expired) session by its token hash.
/// Returns the user_id if valid.
pub async fn find_valid_by_hash(
    db: &DatabaseConnection,
    token_hash: &str,
) -> AppResult<Option<Uuid>> {
    let result = Session::find()
        .filter(session::Column::TokenHash.eq(token_hash))
        .filter(session::Column::RevokedAt.is_null())
        .filter(session::Column::ExpiresAt.gt(Utc::now()))
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up session: {}", e)))?;

    Ok(result.map(|m| m.user_id))
}

/// Revoke a session by its token hash. Returns whether a session was revoked.
pub async fn revoke_by_hash(db: &DatabaseConnection, token_hash: &str) -> AppResult<bool> {
    let result = Session::find()
        .filter(session::Column::TokenHash.eq(token_hash))
        .filter(session::Column::RevokedAt.is_null())
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up session: {}", e)))?;

    if let Some(m) = result {
        let mut active: session::ActiveModel = m.into();
        active.revoked_at = Set(Some(Utc::now()));
        active
            .update(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to revoke session: {}", e)))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Delete expired and revoked sessions. Called lazily on login; there is
/// no background worker in this server.
pub async fn prune_stale(db: &DatabaseConnection) -> AppResult<u64> {
    let result = Session::delete_many()
        .filter(
            Condition::any()
                .add(session::Column::ExpiresAt.lt(Utc::now()))
                .add(session::Column::RevokedAt.is_not_null()),
        )
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to prune sessions: {}", e)))?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        let hash1 = hash_token("hwtt_sess_abc");
        let hash2 = hash_token("hwtt_sess_abc");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex chars
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert!(token.starts_with("hwtt_sess_"));
        assert_eq!(token.len(), "hwtt_sess_".len() + 64);
        assert_ne!(token, generate_token());
    }
}
