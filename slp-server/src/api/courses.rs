//! Course management for the signed-in user
//!
//! All handlers here sit behind `auth_middleware`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use slp_common::parse::{normalize, LIST_SEPARATOR};
use slp_common::seed::{is_default_course, DEFAULT_COURSE_DESCRIPTION, DEFAULT_UNITS};
use slp_common::{parse_list, ListContext};
use tracing::info;

use super::generate::required;
use crate::db::courses::{self, CourseDetail, CourseSummary, NewUnit, DEFAULT_UNIT_ICON};
use crate::db::users::User;
use crate::generation::service;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Pasted unit list: one unit per line, optionally `Title ||| description`
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

fn new_unit(title: impl Into<String>, description: impl Into<String>) -> NewUnit {
    NewUnit {
        title: title.into(),
        description: description.into(),
        icon: DEFAULT_UNIT_ICON.to_string(),
    }
}

/// Units from pasted text
///
/// Any `|||` line switches the whole text to list parsing; otherwise every
/// non-blank line is a unit title. Text with no title left after
/// normalization is a 400.
pub fn units_from_text(course_title: &str, text: &str) -> ApiResult<Vec<NewUnit>> {
    if text.contains(LIST_SEPARATOR) {
        let parsed = parse_list(text, &ListContext::from_title(course_title))?;
        return Ok(parsed.into_iter().map(|u| new_unit(u.title, u.description)).collect());
    }

    let units: Vec<NewUnit> = normalize(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|title| new_unit(title, ""))
        .collect();
    if units.is_empty() {
        return Err(ApiError::BadRequest("units contained no unit titles".to_string()));
    }
    Ok(units)
}

/// GET /api/courses
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<CoursesResponse>> {
    let courses = courses::list_courses(&state.db, &user.id).await?;
    Ok(Json(CoursesResponse { courses }))
}

/// POST /api/courses
///
/// **Request:** `{"title", "description"?, "units"?}`
/// **Response:** 201 with the new course, units included
///
/// Without units, the built-in course title seeds its stock outline and any
/// other title has the generator propose one.
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCourseRequest>,
) -> ApiResult<Response> {
    let title = required("title", &request.title)?;
    let pasted = request.units.as_deref().map(str::trim).filter(|text| !text.is_empty());

    let units = match pasted {
        Some(text) => units_from_text(title, text)?,
        None if is_default_course(title) => DEFAULT_UNITS
            .iter()
            .map(|u| NewUnit {
                title: u.title.to_string(),
                description: u.description.to_string(),
                icon: u.icon.to_string(),
            })
            .collect(),
        None => service::generate_course_outline(state.generator.as_ref(), title)
            .await?
            .into_iter()
            .map(|u| new_unit(u.title, u.description))
            .collect(),
    };

    let description = match request.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ if is_default_course(title) => DEFAULT_COURSE_DESCRIPTION.to_string(),
        _ => String::new(),
    };

    let course_guid = courses::create_course(&state.db, &user.id, title, &description, &units).await?;
    info!("'{}' created course '{}' with {} units", user.username, title, units.len());

    let course = courses::get_course(&state.db, &user.id, &course_guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Created course not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(course)).into_response())
}

/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseDetail>> {
    courses::get_course(&state.db, &user.id, &course_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Course not found: {}", course_id)))
}

/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(course_id): Path<String>,
) -> ApiResult<StatusCode> {
    if courses::delete_course(&state.db, &user.id, &course_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Course not found: {}", course_id)))
    }
}

/// POST /api/subtopics/:id/completion
///
/// **Request:** `{"completed": true}`
/// **Response:** `{"id", "isCompleted"}`
pub async fn set_completion(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(subtopic_id): Path<String>,
    Json(request): Json<CompletionRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if !courses::owns_subtopic(&state.db, &user.id, &subtopic_id).await? {
        return Err(ApiError::NotFound(format!("Subtopic not found: {}", subtopic_id)));
    }

    courses::set_subtopic_completion(&state.db, &subtopic_id, request.completed).await?;
    Ok(Json(json!({ "id": subtopic_id, "isCompleted": request.completed })))
}

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/:id", get(get_course).delete(delete_course))
        .route("/api/subtopics/:id/completion", post(set_completion))
}
