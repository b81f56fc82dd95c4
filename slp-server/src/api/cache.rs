//! Cache inspection and clearing
//!
//! Every operation is limited to the signed-in user's own entries.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::db::users::User;
use crate::AppState;

/// GET /api/cache
///
/// **Response:** `{"size": "1.5 KB"}`
pub async fn cache_size(State(state): State<AppState>, Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({ "size": state.cache.for_user(Some(user.id.as_str())).size_kb() }))
}

/// DELETE /api/cache
///
/// **Response:** `{"cleared": 12}`
pub async fn clear_cache(State(state): State<AppState>, Extension(user): Extension<User>) -> Json<Value> {
    let cleared = state.cache.for_user(Some(user.id.as_str())).clear_all();
    info!("Cleared {} cached entries for {}", cleared, user.username);
    Json(json!({ "cleared": cleared }))
}

/// DELETE /api/cache/units/:unit_key
///
/// Forces the next subtopic request for the unit to generate afresh.
pub async fn clear_unit(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(unit_key): Path<String>,
) -> Json<Value> {
    state.cache.for_user(Some(user.id.as_str())).clear_unit(&unit_key);
    Json(json!({ "success": true }))
}

pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cache", get(cache_size).delete(clear_cache))
        .route("/api/cache/units/:unit_key", delete(clear_unit))
}
