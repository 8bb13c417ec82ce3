//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::UserRole;

/// Insert a new user with an already-hashed password.
/// Fails with Conflict if the username is taken.
pub async fn insert(
    db: &DatabaseConnection,
    username: &str,
    password_hash: &str,
    display_name: Option<&str>,
    email: Option<&str>,
    role: UserRole,
) -> AppResult<user::Model> {
    if find_by_username(db, username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(password_hash.to_string()),
        display_name: Set(display_name.map(|s| s.to_string())),
        email: Set(email.map(|s| s.to_string())),
        role: Set(role.as_str().to_string()),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert user: {}", e)))?;

    Ok(result)
}

/// Find a user by username.
pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> AppResult<Option<user::Model>> {
    let result = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find user: {}", e)))?;

    Ok(result)
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<user::Model>> {
    let result = User::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find user: {}", e)))?;

    Ok(result)
}

/// Record a successful login.
pub async fn touch_last_login(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
    let user = find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = user.into();
    active.last_login_at = Set(Some(Utc::now()));
    active
        .update(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;

    Ok(())
}

/// Find user IDs whose username contains the given substring (admin search).
pub async fn find_ids_by_username_fragment(
    db: &DatabaseConnection,
    fragment: &str,
) -> AppResult<Vec<Uuid>> {
    let users = User::find()
        .filter(user::Column::Username.contains(fragment))
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to search users: {}", e)))?;

    Ok(users.into_iter().map(|u| u.id).collect())
}

/// Total number of users (the first signup is promoted to admin).
pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    let total = User::find()
        .count(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;

    Ok(total)
}
