//! Integration tests for slp-server API endpoints
//!
//! Tests cover:
//! - Health endpoint (no session required)
//! - Generation endpoints: cache hits, regenerate, append, error codes
//! - Chat history and cache administration, both per signed-in user
//! - Accounts and sessions
//! - Courses: creation, persisted subtopics, completion progress

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use slp_common::seed::{DEFAULT_COURSE_DESCRIPTION, DEFAULT_UNITS};
use slp_server::generation::{GenerationRequest, TextGenerator, UpstreamError};
use slp_server::{build_router, AppState};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Generator that answers from a queue of canned replies
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    fn fail(&self, err: UpstreamError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(UpstreamError::EmptyResponse))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Test app over a fresh database; keep the TempDir alive for the test
struct TestApp {
    router: Router,
    generator: Arc<ScriptedGenerator>,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = slp_common::db::init_database(&dir.path().join("slp.db")).await.unwrap();
        let generator = Arc::new(ScriptedGenerator::default());
        let state = AppState::new(db, generator.clone(), 5);
        Self {
            router: build_router(state),
            generator,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request("GET", uri, cookie, None)).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send(request("POST", uri, cookie, Some(body))).await
    }

    async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request("DELETE", uri, cookie, None)).await
    }

    /// Sign up and return the `slp_session=...` cookie pair
    async fn sign_up(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/auth/signup",
                None,
                json!({ "username": username, "password": "secret123" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        session_cookie(&response)
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn extract_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

const SUBTOPICS: &str = "Here are the subtopics:\n\
    1. **Separable Equations** ||| Splitting variables to integrate\n\
    2. Integrating Factors ||| Solving linear first-order equations\n\
    3. Exact Equations ||| Potential functions";

const LESSON: &str = "CONCEPT INTRODUCTION:\nA separable equation splits into f(y) dy = g(x) dx.\n\n\
    HOW TO SOLVE:\nMove each variable to its own side and integrate.\n\n\
    EXAMPLE:\nSolve dy/dx = xy.";

fn practice(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|n| format!("QUESTION {n}: What is {n} squared?\nANSWER {n}: It is {}.", n * n))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn subtopics_request() -> Value {
    json!({ "unitTitle": "First-Order Differential Equations" })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "slp-server");
    assert_eq!(json["generator"]["model"], "scripted");
    assert_eq!(json["generator"]["configured"], true);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_generation_status() {
    let app = TestApp::new().await;
    app.generator.reply("API connection successful");

    let json = extract_json(app.get("/api/generation/status", None).await).await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["model"], "scripted");
}

// =============================================================================
// Subtopics
// =============================================================================

#[tokio::test]
async fn test_subtopics_generated_then_cached() {
    let app = TestApp::new().await;
    app.generator.reply(SUBTOPICS);

    let first = app.post("/api/generate-subtopics", None, subtopics_request()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = extract_json(first).await;

    let subtopics = first["subtopics"].as_array().unwrap();
    assert_eq!(subtopics.len(), 3);
    assert_eq!(subtopics[0]["title"], "Separable Equations");
    assert_eq!(subtopics[0]["id"], "first-order-differential-equations-subtopic-1");
    assert_eq!(subtopics[0]["unitId"], "first-order-differential-equations");
    assert_eq!(subtopics[2]["description"], "Potential functions");

    let second = extract_json(app.post("/api/generate-subtopics", None, subtopics_request()).await).await;
    assert_eq!(second, first);
    assert_eq!(app.generator.calls(), 1, "Second request should be a cache hit");
}

#[tokio::test]
async fn test_subtopics_regenerate_replaces_cache() {
    let app = TestApp::new().await;
    app.generator.reply(SUBTOPICS);
    app.generator.reply("Direction Fields ||| Sketching solutions");

    app.post("/api/generate-subtopics", None, subtopics_request()).await;
    let regenerated = extract_json(
        app.post(
            "/api/generate-subtopics",
            None,
            json!({ "unitTitle": "First-Order Differential Equations", "regenerate": true }),
        )
        .await,
    )
    .await;
    assert_eq!(regenerated["subtopics"].as_array().unwrap().len(), 1);

    let cached = extract_json(app.post("/api/generate-subtopics", None, subtopics_request()).await).await;
    assert_eq!(cached["subtopics"][0]["title"], "Direction Fields");
    assert_eq!(app.generator.calls(), 2);
}

#[tokio::test]
async fn test_subtopics_without_separators_is_empty_result() {
    let app = TestApp::new().await;
    app.generator.reply("I'm sorry, I can't help with that.");

    let response = app.post("/api/generate-subtopics", None, subtopics_request()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = extract_json(response).await;
    assert_eq!(json["error"]["code"], "EMPTY_RESULT");
}

#[tokio::test]
async fn test_subtopics_with_titleless_line_is_malformed() {
    let app = TestApp::new().await;
    app.generator.reply("Separable Equations ||| Splitting\n||| orphan description");

    let response = app.post("/api/generate-subtopics", None, subtopics_request()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = extract_json(response).await;
    assert_eq!(json["error"]["code"], "MALFORMED_RECORD");

    // Nothing partial was cached
    app.generator.reply(SUBTOPICS);
    let retry = extract_json(app.post("/api/generate-subtopics", None, subtopics_request()).await).await;
    assert_eq!(retry["subtopics"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let app = TestApp::new().await;
    app.generator.fail(UpstreamError::Timeout);

    let response = app.post("/api/generate-subtopics", None, subtopics_request()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = extract_json(response).await;
    assert_eq!(json["error"]["code"], "UPSTREAM_FAILURE");
}

#[tokio::test]
async fn test_blank_unit_title_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/generate-subtopics", None, json!({ "unitTitle": "   " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.generator.calls(), 0);
}

// =============================================================================
// Lesson pages and practice questions
// =============================================================================

#[tokio::test]
async fn test_subtopic_page_segments() {
    let app = TestApp::new().await;
    app.generator.reply(LESSON);

    let body = json!({
        "subtopicTitle": "Separable Equations",
        "unitTitle": "First-Order Differential Equations"
    });
    let response = app.post("/api/generate-subtopic-page", None, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response).await;
    let content = &json["content"];
    assert_eq!(content["subtopicId"], "separable-equations");
    assert_eq!(content["segments"]["how_to_solve"], "Move each variable to its own side and integrate.");
    assert_eq!(content["segments"]["example"], "Solve dy/dx = xy.");
    let keys: Vec<&String> = content["segments"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);

    app.post("/api/generate-subtopic-page", None, body).await;
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn test_practice_questions_append() {
    let app = TestApp::new().await;
    app.generator.reply(&practice(5, 1));
    app.generator.reply(&practice(2, 1));

    let body = json!({
        "subtopicTitle": "Separable Equations",
        "unitTitle": "First-Order Differential Equations"
    });
    let first = extract_json(app.post("/api/generate-practice-questions", None, body).await).await;
    let questions = first["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    assert_eq!(questions[0]["id"], "separable-equations-q1");
    assert_eq!(questions[2]["question"], "What is 3 squared?");
    assert_eq!(questions[2]["answer"], "It is 9.");

    let appended = extract_json(
        app.post(
            "/api/generate-practice-questions",
            None,
            json!({
                "subtopicTitle": "Separable Equations",
                "unitTitle": "First-Order Differential Equations",
                "append": true,
                "count": 2
            }),
        )
        .await,
    )
    .await;
    let questions = appended["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 7);
    assert_eq!(questions[5]["id"], "separable-equations-q6");
    assert_eq!(questions[6]["id"], "separable-equations-q7");
    assert_eq!(app.generator.calls(), 2);
}

#[tokio::test]
async fn test_practice_questions_served_from_cache() {
    let app = TestApp::new().await;
    app.generator.reply(&practice(3, 1));

    let body = json!({
        "subtopicTitle": "Exact Equations",
        "unitTitle": "First-Order Differential Equations",
        "count": 3
    });
    app.post("/api/generate-practice-questions", None, body.clone()).await;
    let cached = extract_json(app.post("/api/generate-practice-questions", None, body).await).await;

    assert_eq!(cached["questions"].as_array().unwrap().len(), 3);
    assert_eq!(app.generator.calls(), 1);
}

// =============================================================================
// Chat and cache
// =============================================================================

#[tokio::test]
async fn test_chat_records_history() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;
    app.generator.reply("**Yes.** Divide both sides by y first.");

    let response = app
        .post(
            "/api/chat",
            Some(cookie.as_str()),
            json!({ "message": "Can I divide by y?", "subtopicId": "separable-equations" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response).await;
    assert_eq!(json["response"], "Yes. Divide both sides by y first.");

    let history = extract_json(app.get("/api/chat/separable-equations", Some(cookie.as_str())).await).await;
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Can I divide by y?");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_failure_leaves_history_empty() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;
    app.generator.fail(UpstreamError::NotConfigured);

    let response = app
        .post(
            "/api/chat",
            Some(cookie.as_str()),
            json!({ "message": "Hello?", "subtopicId": "limits" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let history = extract_json(app.get("/api/chat/limits", Some(cookie.as_str())).await).await;
    assert!(history["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_and_cache_require_session() {
    let app = TestApp::new().await;

    let chat = app
        .post("/api/chat", None, json!({ "message": "Hello?", "subtopicId": "limits" }))
        .await;
    assert_eq!(chat.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/chat/limits", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/cache", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.delete("/api/cache", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.delete("/api/cache/units/limits", None).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_chat_history_is_per_user() {
    let app = TestApp::new().await;
    let ada = app.sign_up("ada").await;
    let bob = app.sign_up("bob").await;
    app.generator.reply("Only for Ada.");

    app.post(
        "/api/chat",
        Some(ada.as_str()),
        json!({ "message": "My private question", "subtopicId": "limits" }),
    )
    .await;

    let bobs = extract_json(app.get("/api/chat/limits", Some(bob.as_str())).await).await;
    assert!(bobs["messages"].as_array().unwrap().is_empty());

    // Clearing Bob's cache leaves Ada's conversation alone
    let cleared = extract_json(app.delete("/api/cache", Some(bob.as_str())).await).await;
    assert_eq!(cleared["cleared"], 0);
    let adas = extract_json(app.get("/api/chat/limits", Some(ada.as_str())).await).await;
    assert_eq!(adas["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_anonymous_request_does_not_see_owner_cache() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;

    let course = extract_json(
        app.post("/api/courses", Some(cookie.as_str()), json!({ "title": "Statistics", "units": "Probability" }))
            .await,
    )
    .await;
    let unit_id = course["units"][0]["id"].as_str().unwrap().to_string();

    app.generator.reply("Counting ||| Permutations");
    app.post(
        "/api/generate-subtopics",
        Some(cookie.as_str()),
        json!({ "unitTitle": "Probability", "unitId": unit_id }),
    )
    .await;

    app.generator.reply("Sampling ||| Drawing from a population");
    let anonymous = extract_json(
        app.post(
            "/api/generate-subtopics",
            None,
            json!({ "unitTitle": "Probability", "unitId": unit_id }),
        )
        .await,
    )
    .await;
    assert_eq!(anonymous["subtopics"][0]["title"], "Sampling");
    assert_eq!(app.generator.calls(), 2);
}

#[tokio::test]
async fn test_cache_size_and_clear() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;

    let empty = extract_json(app.get("/api/cache", Some(cookie.as_str())).await).await;
    assert_eq!(empty["size"], "0.0 KB");

    app.generator.reply(SUBTOPICS);
    app.post("/api/generate-subtopics", Some(cookie.as_str()), subtopics_request())
        .await;
    let filled = extract_json(app.get("/api/cache", Some(cookie.as_str())).await).await;
    assert_ne!(filled["size"], "0.0 KB");

    let cleared = extract_json(app.delete("/api/cache", Some(cookie.as_str())).await).await;
    assert_eq!(cleared["cleared"], 1);

    app.generator.reply(SUBTOPICS);
    app.post("/api/generate-subtopics", Some(cookie.as_str()), subtopics_request())
        .await;
    assert_eq!(app.generator.calls(), 2, "Cleared cache should force regeneration");
}

#[tokio::test]
async fn test_clear_unit_forces_regeneration() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;
    app.generator.reply(SUBTOPICS);
    app.generator.reply(SUBTOPICS);

    app.post("/api/generate-subtopics", Some(cookie.as_str()), subtopics_request())
        .await;
    let response = app
        .delete("/api/cache/units/first-order-differential-equations", Some(cookie.as_str()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    app.post("/api/generate-subtopics", Some(cookie.as_str()), subtopics_request())
        .await;
    assert_eq!(app.generator.calls(), 2);
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_signup_signin_me_signout() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;
    assert!(cookie.starts_with("slp_session="));

    let me = app.get("/api/auth/me", Some(cookie.as_str())).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(extract_json(me).await["user"]["username"], "ada");

    let signout = app.send(request("POST", "/api/auth/signout", Some(cookie.as_str()), None)).await;
    assert_eq!(signout.status(), StatusCode::OK);
    assert_eq!(app.get("/api/auth/me", Some(cookie.as_str())).await.status(), StatusCode::UNAUTHORIZED);

    let signin = app
        .post("/api/auth/signin", None, json!({ "username": "ada", "password": "secret123" }))
        .await;
    assert_eq!(signin.status(), StatusCode::OK);
    let cookie = session_cookie(&signin);
    assert_eq!(app.get("/api/auth/me", Some(cookie.as_str())).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let app = TestApp::new().await;
    app.sign_up("ada").await;

    let response = app
        .post("/api/auth/signin", None, json!({ "username": "ada", "password": "wrong-password" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflict() {
    let app = TestApp::new().await;
    app.sign_up("ada").await;

    let response = app
        .post("/api/auth/signup", None, json!({ "username": "ADA", "password": "secret123" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_short_password_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/auth/signup", None, json!({ "username": "ada", "password": "abc" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// Courses
// =============================================================================

#[tokio::test]
async fn test_courses_require_session() {
    let app = TestApp::new().await;

    let response = app.get("/api/courses", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(extract_json(response).await["error"]["code"], "UNAUTHORIZED");

    let response = app.get("/api/courses", Some("slp_session=not-a-session")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_default_course_seeds_units() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;

    let response = app
        .post("/api/courses", Some(cookie.as_str()), json!({ "title": "Differential Equations" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let course = extract_json(response).await;
    assert_eq!(course["description"], DEFAULT_COURSE_DESCRIPTION);
    let units = course["units"].as_array().unwrap();
    assert_eq!(units.len(), DEFAULT_UNITS.len());
    assert_eq!(units[2]["title"], DEFAULT_UNITS[2].title);
    assert_eq!(units[2]["icon"], DEFAULT_UNITS[2].icon);
    assert_eq!(app.generator.calls(), 0);

    let list = extract_json(app.get("/api/courses", Some(cookie.as_str())).await).await;
    assert_eq!(list["courses"].as_array().unwrap().len(), 1);
    assert_eq!(list["courses"][0]["progress"], json!({ "completed": 0, "total": 0 }));
}

#[tokio::test]
async fn test_create_course_generates_outline() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;
    app.generator.reply("Probability ||| Chance and counting\nInference ||| Drawing conclusions");

    let course = extract_json(
        app.post("/api/courses", Some(cookie.as_str()), json!({ "title": "Statistics" }))
            .await,
    )
    .await;
    let units = course["units"].as_array().unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[1]["title"], "Inference");
    assert_eq!(units[1]["description"], "Drawing conclusions");
}

#[tokio::test]
async fn test_courses_are_private() {
    let app = TestApp::new().await;
    let ada = app.sign_up("ada").await;
    let bob = app.sign_up("bob").await;

    let course = extract_json(
        app.post("/api/courses", Some(ada.as_str()), json!({ "title": "Statistics", "units": "Probability" }))
            .await,
    )
    .await;
    let course_id = course["id"].as_str().unwrap();

    let uri = format!("/api/courses/{}", course_id);
    assert_eq!(app.get(&uri, Some(bob.as_str())).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(bob.as_str())).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(ada.as_str())).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, Some(ada.as_str())).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owned_unit_persists_subtopics_and_progress() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;

    let course = extract_json(
        app.post(
            "/api/courses",
            Some(cookie.as_str()),
            json!({ "title": "Statistics", "units": "Probability\nInference" }),
        )
        .await,
    )
    .await;
    let course_id = course["id"].as_str().unwrap().to_string();
    let unit_id = course["units"][0]["id"].as_str().unwrap().to_string();

    app.generator.reply("Counting ||| Permutations\nConditional Probability ||| Bayes");
    let generated = extract_json(
        app.post(
            "/api/generate-subtopics",
            Some(cookie.as_str()),
            json!({ "unitTitle": "Probability", "courseTitle": "Statistics", "unitId": unit_id }),
        )
        .await,
    )
    .await;
    let subtopics = generated["subtopics"].as_array().unwrap();
    assert_eq!(subtopics.len(), 2);
    assert_eq!(subtopics[0]["unitId"], unit_id.as_str());
    assert_ne!(subtopics[0]["id"], "probability-subtopic-1");

    let detail = extract_json(app.get(&format!("/api/courses/{}", course_id), Some(cookie.as_str())).await).await;
    assert_eq!(detail["units"][0]["subtopics"], generated["subtopics"]);

    let subtopic_id = subtopics[0]["id"].as_str().unwrap();
    let completion = app
        .post(
            &format!("/api/subtopics/{}/completion", subtopic_id),
            Some(cookie.as_str()),
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(completion.status(), StatusCode::OK);
    assert_eq!(extract_json(completion).await["isCompleted"], true);

    let list = extract_json(app.get("/api/courses", Some(cookie.as_str())).await).await;
    assert_eq!(list["courses"][0]["progress"], json!({ "completed": 1, "total": 2 }));

    // Stored subtopics are served without another generation call
    app.post(
        "/api/generate-subtopics",
        Some(cookie.as_str()),
        json!({ "unitTitle": "Probability", "unitId": unit_id }),
    )
    .await;
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn test_completion_for_unknown_subtopic() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("ada").await;

    let response = app
        .post(
            "/api/subtopics/no-such-subtopic/completion",
            Some(cookie.as_str()),
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
