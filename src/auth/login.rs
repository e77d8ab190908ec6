//! Moderator login
//!
//! A single configured moderator account signs in with a password and
//! receives an HMAC-signed session token, set as an HttpOnly cookie and
//! also returned in the body for bearer use.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;

use super::middleware::{CurrentUser, SESSION_COOKIE};
use super::session::{Session, create_session_token};
use crate::AppState;
use crate::api::dto::{ApiResponse, LoginRequest, MessageResponse, SessionResponse};
use crate::config::AuthConfig;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - POST /api/auth/login - Exchange credentials for a session
/// - POST /api/auth/logout - Clear the session cookie
/// - GET /api/auth/me - Current session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// Hash a password into the Argon2id PHC string stored in config
///
/// Every call draws a fresh random salt, so hashing the same password
/// twice gives different strings.
///
/// # Errors
/// Returns `Internal` if the hasher rejects its input
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn credentials_match(auth: &AuthConfig, username: &str, password: &str) -> bool {
    let username_ok = username.as_bytes().ct_eq(auth.admin_username.as_bytes());

    // Verify the password even for a wrong username so both paths cost the same
    let password_ok = match PasswordHash::new(&auth.admin_password_hash) {
        Ok(stored) => Argon2::default()
            .verify_password(password.as_bytes(), &stored)
            .is_ok(),
        Err(error) => {
            tracing::error!(%error, "Configured moderator password hash is unreadable");
            false
        }
    };

    bool::from(username_ok) && password_ok
}

fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), AppError> {
    let auth = &state.config.auth;

    if !credentials_match(auth, request.username.trim(), &request.password) {
        tracing::warn!(username = %request.username, "Rejected moderator login");
        return Err(AppError::Unauthorized);
    }

    let session = Session::start(&auth.admin_username, auth.session_max_age);
    let token = create_session_token(&session, &auth.session_secret)?;
    let cookie = build_session_cookie(token.clone(), state.config.should_use_secure_cookies());

    tracing::info!(username = %session.username, "Moderator signed in");

    Ok((
        jar.add(cookie),
        Json(ApiResponse::ok(SessionResponse {
            username: session.username,
            expires_at: session.expires_at,
            token: Some(token),
        })),
    ))
}

/// POST /api/auth/logout
async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    (
        jar.add(clear_session_cookie()),
        Json(ApiResponse::ok(MessageResponse::new("Logged out"))),
    )
}

/// GET /api/auth/me
async fn me(CurrentUser(session): CurrentUser) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(SessionResponse {
        username: session.username,
        expires_at: session.expires_at,
        token: None,
    }))
}
