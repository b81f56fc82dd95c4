//! Generation endpoints: subtopic lists, lesson pages, practice questions
//!
//! Lookups go cache first, then the generation service. Cached entries are
//! kept per caller: signed-in users each get their own scope and anonymous
//! requests share the public one. A request that names a unit or subtopic
//! belonging to the signed-in user also reads from and writes to that user's
//! stored course.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use slp_common::cache::GenerationCache;
use slp_common::parse::slug;
use slp_common::seed::DEFAULT_COURSE_TITLE;
use slp_common::{GeneratedSubtopic, PracticeQuestion, PracticeSet, SubtopicContent};
use tracing::debug;

use super::auth::current_user;
use crate::db::{courses, users::User};
use crate::generation::service;
use crate::{ApiError, ApiResult, AppState};

/// Upper bound on practice questions per request
pub const MAX_PRACTICE_QUESTIONS: usize = 20;

fn default_course_title() -> String {
    DEFAULT_COURSE_TITLE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSubtopicsRequest {
    pub unit_title: String,
    #[serde(default = "default_course_title")]
    pub course_title: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Serialize)]
pub struct SubtopicsResponse {
    pub subtopics: Vec<GeneratedSubtopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub subtopic_title: String,
    pub unit_title: String,
    #[serde(default = "default_course_title")]
    pub course_title: String,
    #[serde(default)]
    pub subtopic_id: Option<String>,
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: SubtopicContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePracticeRequest {
    pub subtopic_title: String,
    pub unit_title: String,
    #[serde(default = "default_course_title")]
    pub course_title: String,
    #[serde(default)]
    pub subtopic_id: Option<String>,
    /// Add a new batch to the existing questions instead of replacing them
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub regenerate: bool,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PracticeResponse {
    pub questions: Vec<PracticeQuestion>,
}

/// Trimmed non-empty field value, else 400
pub(crate) fn required<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(value)
}

/// Signed-in user, if any, and the cache scope belonging to them
async fn caller(state: &AppState, headers: &HeaderMap) -> ApiResult<(Option<User>, GenerationCache)> {
    let user = current_user(state, headers).await?;
    let cache = state.cache.for_user(user.as_ref().map(|u| u.id.as_str()));
    Ok((user, cache))
}

/// `id` when it names a unit of the signed-in user
async fn owned_unit(state: &AppState, user: Option<&User>, id: Option<&str>) -> ApiResult<Option<String>> {
    let (Some(user), Some(id)) = (user, id) else {
        return Ok(None);
    };
    Ok(courses::owns_unit(&state.db, &user.id, id).await?.then(|| id.to_string()))
}

/// `id` when it names a subtopic of the signed-in user
async fn owned_subtopic(state: &AppState, user: Option<&User>, id: Option<&str>) -> ApiResult<Option<String>> {
    let (Some(user), Some(id)) = (user, id) else {
        return Ok(None);
    };
    Ok(courses::owns_subtopic(&state.db, &user.id, id).await?.then(|| id.to_string()))
}

/// POST /api/generate-subtopics
///
/// **Request:** `{"unitTitle", "courseTitle"?, "unitId"?, "regenerate"?}`
/// **Response:** `{"subtopics": [...]}`
///
/// For a stored unit the generated list replaces the unit's subtopics.
pub async fn generate_subtopics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GenerateSubtopicsRequest>,
) -> ApiResult<Json<SubtopicsResponse>> {
    let unit_title = required("unitTitle", &request.unit_title)?;
    let unit_key = request.unit_id.clone().unwrap_or_else(|| slug(unit_title));
    let (user, cache) = caller(&state, &headers).await?;
    let stored_unit = owned_unit(&state, user.as_ref(), request.unit_id.as_deref()).await?;

    if !request.regenerate {
        if let Some(unit_guid) = &stored_unit {
            let subtopics = courses::load_subtopics(&state.db, unit_guid).await?;
            if !subtopics.is_empty() {
                debug!("Serving stored subtopics for unit {}", unit_guid);
                return Ok(Json(SubtopicsResponse { subtopics }));
            }
        } else if let Some(subtopics) = cache.subtopics(&unit_key) {
            debug!("Serving cached subtopics for {}", unit_key);
            return Ok(Json(SubtopicsResponse { subtopics }));
        }
    }

    let mut subtopics = service::generate_subtopics(
        state.generator.as_ref(),
        unit_title,
        &request.course_title,
        request.unit_id.as_deref(),
    )
    .await?;

    if let Some(unit_guid) = &stored_unit {
        subtopics = courses::replace_subtopics(&state.db, unit_guid, &subtopics).await?;
    }
    cache.set_subtopics(&unit_key, &subtopics);

    Ok(Json(SubtopicsResponse { subtopics }))
}

/// POST /api/generate-subtopic-page
///
/// **Request:** `{"subtopicTitle", "unitTitle", "courseTitle"?, "subtopicId"?, "regenerate"?}`
/// **Response:** `{"content": {"subtopicId", "segments", "generatedAt"}}`
pub async fn generate_subtopic_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GenerateContentRequest>,
) -> ApiResult<Json<ContentResponse>> {
    let subtopic_title = required("subtopicTitle", &request.subtopic_title)?;
    let unit_title = required("unitTitle", &request.unit_title)?;
    let key = request.subtopic_id.clone().unwrap_or_else(|| slug(subtopic_title));
    let (user, cache) = caller(&state, &headers).await?;
    let stored_subtopic = owned_subtopic(&state, user.as_ref(), request.subtopic_id.as_deref()).await?;

    if !request.regenerate {
        if let Some(content) = cache.content(&key) {
            debug!("Serving cached lesson for {}", key);
            return Ok(Json(ContentResponse { content }));
        }
        if let Some(guid) = &stored_subtopic {
            if let Some(content) = courses::load_info_page(&state.db, guid).await? {
                cache.set_content(&key, &content);
                return Ok(Json(ContentResponse { content }));
            }
        }
    }

    let content = service::generate_content(
        state.generator.as_ref(),
        &state.vocabulary,
        subtopic_title,
        unit_title,
        &request.course_title,
        request.subtopic_id.as_deref(),
    )
    .await?;

    if stored_subtopic.is_some() {
        courses::save_info_page(&state.db, subtopic_title, &content).await?;
    }
    cache.set_content(&key, &content);

    Ok(Json(ContentResponse { content }))
}

/// POST /api/generate-practice-questions
///
/// **Request:** `{"subtopicTitle", "unitTitle", "courseTitle"?, "subtopicId"?, "append"?, "regenerate"?, "count"?}`
/// **Response:** `{"questions": [...]}`, the whole set after any append
pub async fn generate_practice_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GeneratePracticeRequest>,
) -> ApiResult<Json<PracticeResponse>> {
    let subtopic_title = required("subtopicTitle", &request.subtopic_title)?;
    let unit_title = required("unitTitle", &request.unit_title)?;
    let count = request
        .count
        .unwrap_or(state.practice_question_count)
        .clamp(1, MAX_PRACTICE_QUESTIONS);
    let key = request.subtopic_id.clone().unwrap_or_else(|| slug(subtopic_title));
    let (user, cache) = caller(&state, &headers).await?;
    let stored_subtopic = owned_subtopic(&state, user.as_ref(), request.subtopic_id.as_deref()).await?;

    let existing = match &stored_subtopic {
        Some(guid) => courses::load_question_page(&state.db, guid).await?,
        None => cache.practice(&key),
    };

    if !request.append && !request.regenerate {
        if let Some(set) = existing.as_ref().filter(|set| !set.questions.is_empty()) {
            debug!("Serving existing practice set for {}", key);
            return Ok(Json(PracticeResponse {
                questions: set.questions.clone(),
            }));
        }
    }

    let questions = service::generate_practice(
        state.generator.as_ref(),
        subtopic_title,
        unit_title,
        &request.course_title,
        count,
    )
    .await?;

    let set = match (stored_subtopic, request.append) {
        (Some(_), append) => {
            let set = match existing {
                Some(mut set) if append => {
                    set.append(questions);
                    set
                }
                _ => PracticeSet::new(key.clone(), questions),
            };
            courses::save_question_page(&state.db, &set).await?;
            cache.set_practice(&key, &set);
            set
        }
        (None, true) => cache.append_practice(&key, questions),
        (None, false) => {
            let set = PracticeSet::new(key.clone(), questions);
            cache.set_practice(&key, &set);
            set
        }
    };

    Ok(Json(PracticeResponse { questions: set.questions }))
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate-subtopics", post(generate_subtopics))
        .route("/api/generate-subtopic-page", post(generate_subtopic_page))
        .route("/api/generate-practice-questions", post(generate_practice_questions))
}
