//! Tutoring chat, one conversation per subtopic and signed-in user

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use slp_common::{ChatMessage, ChatRole};

use super::generate::required;
use crate::db::users::User;
use crate::generation::service;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub subtopic_id: String,
    /// Lesson text or title the question refers to
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

/// POST /api/chat
///
/// **Request:** `{"message", "subtopicId", "context"?}`
/// **Response:** `{"response": "..."}`
///
/// Both the question and the reply are appended to the subtopic's history.
/// A failed generation leaves the history untouched.
pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = required("message", &request.message)?;
    let subtopic_id = required("subtopicId", &request.subtopic_id)?;

    let response = service::chat_reply(state.generator.as_ref(), message, request.context.as_deref()).await?;

    let cache = state.cache.for_user(Some(user.id.as_str()));
    cache.push_chat(subtopic_id, ChatMessage::new(ChatRole::User, message));
    cache.push_chat(subtopic_id, ChatMessage::new(ChatRole::Assistant, response.clone()));

    Ok(Json(ChatResponse { response }))
}

/// GET /api/chat/:subtopic_id
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(subtopic_id): Path<String>,
) -> Json<ChatHistoryResponse> {
    Json(ChatHistoryResponse {
        messages: state.cache.for_user(Some(user.id.as_str())).chat_history(&subtopic_id),
    })
}

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/:subtopic_id", get(chat_history))
}
