//! Actix-web extractor for session-cookie authentication.
//!
//! The session token from the cookie is hashed immediately; only the
//! SHA-256 digest is compared against stored sessions.

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;

use super::CurrentUser;
use crate::config::SESSION_COOKIE;
use crate::db::{DbPool, sessions, users};
use crate::error::ErrorResponse;
use crate::models::UserRole;

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        AuthError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a valid session cookie.
///
/// Use this in handlers that require authentication:
/// ```ignore
/// async fn protected_handler(auth: SessionAuth) -> impl Responder {
///     // auth.user is the authenticated caller
/// }
/// ```
pub struct SessionAuth {
    pub user: CurrentUser,
}

impl SessionAuth {
    /// True if the caller holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }
}

impl FromRequest for SessionAuth {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let pool = req
                .app_data::<web::Data<DbPool>>()
                .ok_or_else(|| AuthError::new("Internal configuration error"))?
                .clone();

            // Hash the cookie token immediately; the raw value is not kept.
            let token_hash = match req.cookie(SESSION_COOKIE) {
                Some(cookie) => sessions::hash_token(cookie.value()),
                None => {
                    return Err(AuthError::new(
                        "Not signed in. Provide a session cookie via /api/v1/auth/login.",
                    ));
                }
            };

            let user_id = sessions::find_valid_by_hash(pool.connection(), &token_hash)
                .await
                .map_err(|e| AuthError::new(e.to_string()))?
                .ok_or_else(|| AuthError::new("Session is expired or revoked"))?;

            let user = users::find_by_id(pool.connection(), user_id)
                .await
                .map_err(|e| AuthError::new(e.to_string()))?
                .ok_or_else(|| AuthError::new("Session user no longer exists"))?;

            Ok(SessionAuth {
                user: CurrentUser {
                    id: user.id,
                    username: user.username,
                    role: UserRole::parse(&user.role).unwrap_or(UserRole::Member),
                },
            })
        })
    }
}
