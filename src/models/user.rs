//! User domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// User role. Admins get the administrative console; members only see
/// their own runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Signup request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> AppResult<()> {
        let name = self.username.trim();
        if name.is_empty() || name.len() > 100 {
            return Err(AppError::InvalidInput(
                "username must be 1-100 characters".to_string(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(AppError::InvalidInput(
                "username may only contain letters, digits, '_', '-' and '.'".to_string(),
            ));
        }
        if self.password.len() < 8 {
            return Err(AppError::InvalidInput(
                "password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user. Never contains the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(m: crate::entity::user::Model) -> Self {
        UserResponse {
            id: m.id,
            username: m.username,
            display_name: m.display_name,
            email: m.email,
            role: UserRole::parse(&m.role).unwrap_or(UserRole::Member),
            last_login_at: m.last_login_at,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_valid() {
        let req = SignupRequest {
            username: "engineer-1".to_string(),
            password: "s3cret-password".to_string(),
            display_name: None,
            email: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let req = SignupRequest {
            username: "engineer-1".to_string(),
            password: "short".to_string(),
            display_name: None,
            email: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_rejects_bad_username() {
        let req = SignupRequest {
            username: "not valid!".to_string(),
            password: "s3cret-password".to_string(),
            display_name: None,
            email: None,
        };
        assert!(req.validate().is_err());
    }
}
