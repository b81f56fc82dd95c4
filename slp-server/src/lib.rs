//! slp-server library - self-paced learning service
//!
//! Generates course outlines, lesson pages and practice questions through a
//! text generation service, caches the parsed results, and stores courses and
//! progress for signed-in users.

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use slp_common::cache::GenerationCache;
use slp_common::LabelVocabulary;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod generation;

pub use error::{ApiError, ApiResult};

use generation::TextGenerator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Text generation backend
    pub generator: Arc<dyn TextGenerator>,
    /// Cache of generated content
    pub cache: GenerationCache,
    /// Labels recognized in lesson pages
    pub vocabulary: Arc<LabelVocabulary>,
    /// Practice questions per request when the client does not say
    pub practice_question_count: usize,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state with an in-memory cache and the stock vocabulary
    pub fn new(db: SqlitePool, generator: Arc<dyn TextGenerator>, practice_question_count: usize) -> Self {
        Self {
            db,
            generator,
            cache: GenerationCache::in_memory(),
            vocabulary: Arc::new(LabelVocabulary::default()),
            practice_question_count,
            startup_time: slp_common::time::now(),
        }
    }
}

/// Build application router
///
/// Course, chat and cache routes and `/api/auth/me` require a session; health,
/// sign-in and generation are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = Router::new()
        .merge(api::session_routes())
        .merge(api::course_routes())
        .merge(api::chat_routes())
        .merge(api::cache_routes())
        .layer(middleware::from_fn_with_state(state.clone(), api::auth_middleware));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::auth_routes())
        .merge(api::generate_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
