//! Accounts and session authentication
//!
//! Sessions are opaque tokens carried in the `slp_session` cookie. Protected
//! routes go through [`auth_middleware`], which puts the signed-in [`User`]
//! into request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use slp_common::auth::validate_credentials;
use slp_common::db::session_timeout_seconds;
use tracing::info;

use crate::db::{sessions, users, users::User};
use crate::{ApiError, ApiResult, AppState};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "slp_session";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Session token from the `Cookie` header, if any
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Signed-in user for a request, `None` without a valid session
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<User>> {
    match session_token(headers) {
        Some(token) => Ok(sessions::session_user(&state.db, &token).await?),
        None => Ok(None),
    }
}

/// Authentication middleware
///
/// Rejects requests without a valid session with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&state, request.headers())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn session_cookie(token: &str, max_age_seconds: i64) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid session cookie: {}", e)))
}

fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("slp_session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

async fn start_session(state: &AppState, user: &User) -> ApiResult<HeaderValue> {
    let timeout = session_timeout_seconds(&state.db).await?;
    let token = sessions::create_session(&state.db, &user.id, timeout).await?;
    session_cookie(&token, timeout)
}

/// POST /api/auth/signup
///
/// **Request:** `{"username": "...", "password": "..."}`
/// **Response:** 201 `{"user": {"id", "username"}}` plus session cookie
///
/// **Errors:**
/// - 400 Bad Request: username not 3-64 characters, or password under 6
/// - 409 Conflict: username taken
pub async fn signup(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> ApiResult<Response> {
    let username = credentials.username.trim();
    validate_credentials(username, &credentials.password).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let taken = || ApiError::Conflict(format!("Username '{}' is already taken", username));
    if users::username_exists(&state.db, username).await? {
        return Err(taken());
    }

    let user = users::create_user(&state.db, username, &credentials.password)
        .await?
        .ok_or_else(taken)?;
    let cookie = start_session(&state, &user).await?;
    info!("New account '{}'", user.username);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "user": user })),
    )
        .into_response())
}

/// POST /api/auth/signin
pub async fn signin(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> ApiResult<Response> {
    let user = users::authenticate(&state.db, credentials.username.trim(), &credentials.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let cookie = start_session(&state, &user).await?;
    info!("'{}' signed in", user.username);

    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "user": user }))).into_response())
}

/// POST /api/auth/signout
///
/// Always succeeds; the session, if any, is deleted and the cookie cleared.
pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = session_token(&headers) {
        sessions::delete_session(&state.db, &token).await?;
    }
    Ok(([(header::SET_COOKIE, expired_cookie())], Json(json!({ "success": true }))).into_response())
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<User>) -> Json<serde_json::Value> {
    Json(json!({ "user": user }))
}

/// Routes that establish or end a session
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/signout", post(signout))
}

/// Routes that need a session
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me))
}
