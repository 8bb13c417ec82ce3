//! Account routes: signup, login, logout, current user.
//!
//! Session model: an opaque token (SHA-256 hashed in the database) in an
//! HttpOnly cookie. Passwords are stored as PBKDF2-HMAC-SHA256 hashes.
//!
//! Endpoints:
//! 1. POST /auth/signup — Create account, issue session (auto-login)
//! 2. POST /auth/login — Verify password, issue session
//! 3. POST /auth/logout — Revoke session in DB, clear cookie
//! 4. GET /auth/me — Return current user, or null when not signed in

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{info, warn};

use crate::auth;
use crate::config::{Config, SESSION_COOKIE};
use crate::db::{DbPool, sessions, users};
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, SignupRequest, UserResponse, UserRole};

/// Configure account routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(login)
        .service(logout)
        .service(get_current_user);
}

/// Build the session cookie holding the raw token.
fn session_cookie(token: String, ttl_secs: u64, is_prod: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(is_prod);
    cookie.set_max_age(actix_web::cookie::time::Duration::seconds(ttl_secs as i64));
    cookie
}

/// Build an expired cookie that clears the session on the client.
fn clear_session_cookie(is_prod: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(is_prod);
    cookie.set_max_age(actix_web::cookie::time::Duration::ZERO);
    cookie
}

/// Issue a new session for the user and attach the cookie to the response.
async fn issue_session(
    pool: &DbPool,
    user_id: uuid::Uuid,
    config: &Config,
) -> AppResult<Cookie<'static>> {
    let token = sessions::generate_token();
    let token_hash = sessions::hash_token(&token);
    sessions::insert(
        pool.connection(),
        user_id,
        &token_hash,
        config.session_ttl_secs,
    )
    .await?;

    Ok(session_cookie(
        token,
        config.session_ttl_secs,
        config.environment.is_production(),
    ))
}

/// Create a new account.
///
/// The very first account on a fresh database is promoted to admin so the
/// administrative console is reachable without out-of-band bootstrapping.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/signup")]
pub async fn signup(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let role = if users::count(pool.connection()).await? == 0 {
        UserRole::Admin
    } else {
        UserRole::Member
    };

    let password_hash = auth::hash_password(&req.password);
    let user = users::insert(
        pool.connection(),
        req.username.trim(),
        &password_hash,
        req.display_name.as_deref(),
        req.email.as_deref(),
        role,
    )
    .await?;

    info!("User signed up: {} (role={})", user.username, user.role);

    let cookie = issue_session(pool.get_ref(), user.id, config.get_ref()).await?;
    let response: UserResponse = user.into();

    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

/// Sign in with username and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserResponse),
        (status = 401, description = "Bad credentials", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = users::find_by_username(pool.connection(), req.username.trim()).await?;

    // Verify against a well-formed dummy hash when the user is unknown so
    // the response time does not reveal whether the username exists.
    let verified = match &user {
        Some(u) => auth::verify_password(&req.password, &u.password_hash),
        None => {
            let _ = auth::verify_password(&req.password, auth::DUMMY_HASH);
            false
        }
    };

    let Some(user) = user.filter(|_| verified) else {
        warn!("Failed login attempt for username '{}'", req.username);
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    };

    // Opportunistic cleanup; there is no background worker in this server.
    let pruned = sessions::prune_stale(pool.connection()).await?;
    if pruned > 0 {
        info!("Pruned {} stale sessions", pruned);
    }

    users::touch_last_login(pool.connection(), user.id).await?;

    info!("User logged in: {}", user.username);

    let cookie = issue_session(pool.get_ref(), user.id, config.get_ref()).await?;
    let response: UserResponse = user.into();

    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

/// Sign out: revoke the session server-side and clear the cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Signed out"),
    )
)]
#[post("/auth/logout")]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let token_hash = sessions::hash_token(cookie.value());
        let _ = sessions::revoke_by_hash(pool.connection(), &token_hash).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(config.environment.is_production()))
        .json(serde_json::json!({ "ok": true })))
}

/// Get the current authenticated user, or null when not signed in.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user (null when signed out)"),
    )
)]
#[get("/auth/me")]
pub async fn get_current_user(
    req: HttpRequest,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let token_hash = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => sessions::hash_token(cookie.value()),
        None => return Ok(HttpResponse::Ok().json(serde_json::json!({ "user": null }))),
    };

    let user_id = match sessions::find_valid_by_hash(pool.connection(), &token_hash).await? {
        Some(id) => id,
        None => return Ok(HttpResponse::Ok().json(serde_json::json!({ "user": null }))),
    };

    match users::find_by_id(pool.connection(), user_id).await? {
        Some(user) => {
            let response: UserResponse = user.into();
            Ok(HttpResponse::Ok().json(serde_json::json!({ "user": response })))
        }
        None => Ok(HttpResponse::Ok().json(serde_json::json!({ "user": null }))),
    }
}
