// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AnswerResponse, CreateNoteRequest, CreateNoteResponse, CredentialsRequest, HealthChecks,
        HealthConfig, HealthResponse, LoginResponse, MeResponse, NoteListResponse, NoteResponse,
        QuestionRequest, RegisterResponse, SearchRequest, SearchResponse, SessionInfoResponse,
        SuccessResponse, SummaryResponse, UpdateNoteRequest,
    },
    notes::Note,
    state::AppState,
};

pub mod assistant;
pub mod auth;
pub mod health;
pub mod notes;
pub mod session;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/notes",
            get(notes::get_notes)
                .post(notes::create_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/search", post(assistant::search))
        .route("/ask", post(assistant::ask))
        .route("/summarize", post(assistant::summarize))
        .route("/session", get(session::session_info))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        notes::get_notes,
        notes::create_note,
        notes::update_note,
        notes::delete_note,
        assistant::search,
        assistant::ask,
        assistant::summarize,
        session::session_info,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            Note,
            CredentialsRequest,
            RegisterResponse,
            LoginResponse,
            MeResponse,
            SuccessResponse,
            CreateNoteRequest,
            UpdateNoteRequest,
            CreateNoteResponse,
            NoteListResponse,
            NoteResponse,
            SearchRequest,
            SearchResponse,
            QuestionRequest,
            AnswerResponse,
            SummaryResponse,
            SessionInfoResponse,
            HealthResponse,
            HealthConfig,
            HealthChecks
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Notes", description = "Owner-scoped note storage"),
        (name = "Assistant", description = "Private-LLM search, answers and summaries"),
        (name = "Session", description = "Session diagnostics"),
        (name = "Health", description = "Liveness and storage checks")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SESSION_COOKIE_NAME;
    use crate::state::tests::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// A browser: one cookie, replayed on every request.
    struct Client {
        app: Router,
        cookie: Option<String>,
    }

    impl Client {
        fn new(app: &Router) -> Self {
            Self {
                app: app.clone(),
                cookie: None,
            }
        }

        async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(cookie) = &self.cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.app.clone().oneshot(request).await.unwrap();
            self.remember_cookie(&response);

            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        fn remember_cookie(&mut self, response: &Response) {
            for header in response.headers().get_all(header::SET_COOKIE) {
                let Ok(raw) = header.to_str() else { continue };
                let pair = raw.split(';').next().unwrap_or_default();
                let Some((name, value)) = pair.split_once('=') else { continue };
                if name.trim() != SESSION_COOKIE_NAME {
                    continue;
                }
                self.cookie = if value.is_empty() {
                    None
                } else {
                    Some(pair.to_string())
                };
            }
        }

        async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::GET, uri, None).await
        }

        async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, Some(body)).await
        }
    }

    async fn app(reply: Option<&str>) -> (Router, tempfile::TempDir) {
        let (state, dir) = test_state(reply).await;
        (router(state), dir)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (app, _dir) = app(None).await;
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn first_contact_issues_a_session_cookie() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);

        let (status, me) = browser.get("/auth/me").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, json!({ "isAuthenticated": false }));
        assert!(browser.cookie.is_some());

        let (_, first) = browser.get("/session").await;
        let (_, second) = browser.get("/session").await;
        assert_eq!(first["sessionId"], second["sessionId"]);
        assert_eq!(first["userId"], "not set");
        assert!(first["sessionId"].as_str().unwrap().ends_with("..."));
    }

    #[tokio::test]
    async fn register_login_me_logout() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);

        let (status, registered) = browser
            .post("/auth/register", json!({ "email": "Ada@Example.com", "password": "lovelace" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(registered["success"], true);
        assert_eq!(registered["message"], "User registered successfully");
        let user_id = registered["userId"].as_str().unwrap().to_string();

        let (_, me) = browser.get("/auth/me").await;
        assert_eq!(me["isAuthenticated"], true);
        assert_eq!(me["userId"], user_id.as_str());
        assert_eq!(me["email"], "ada@example.com");
        assert!(me["userDid"].as_str().unwrap().starts_with("did:nil:"));

        let (status, bye) = browser.post("/auth/logout", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bye["message"], "Logged out successfully");
        assert!(browser.cookie.is_none());

        let (_, me) = browser.get("/auth/me").await;
        assert_eq!(me, json!({ "isAuthenticated": false }));

        let (status, error) = browser
            .post("/auth/login", json!({ "email": "ada@example.com", "password": "wrong-one" }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error, json!({ "error": "Invalid email or password" }));

        let (status, login) = browser
            .post("/auth/login", json!({ "email": "ada@example.com", "password": "lovelace" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["message"], "Login successful");
        assert_eq!(login["userId"], user_id.as_str());

        let (_, me) = browser.get("/auth/me").await;
        assert_eq!(me["isAuthenticated"], true);
    }

    #[tokio::test]
    async fn registration_errors() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);

        let (status, error) = browser.post("/auth/register", json!({ "email": "x@y.z" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Email and password are required");

        let (status, error) = browser
            .post("/auth/register", json!({ "email": "x@y.z", "password": "12345" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Password must be at least 6 characters");

        browser
            .post("/auth/register", json!({ "email": "x@y.z", "password": "123456" }))
            .await;
        let mut other = Client::new(&app);
        let (status, error) = other
            .post("/auth/register", json!({ "email": "X@y.z", "password": "654321" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "User with this email already exists");
    }

    #[tokio::test]
    async fn note_crud_over_http() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);

        let (status, error) = browser.post("/notes", json!({ "title": "only title" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Title and content are required");

        let (status, created) = browser
            .post("/notes", json!({ "title": "Recipe", "content": "flour, water", "tags": ["food"] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["success"], true);
        let id = created["noteId"].as_str().unwrap().to_string();

        let (status, fetched) = browser.get(&format!("/notes?id={id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["note"]["_id"], id.as_str());
        assert_eq!(fetched["note"]["content"], "flour, water");
        assert_eq!(fetched["note"]["tags"], json!(["food"]));

        let (status, error) = browser
            .send(Method::PUT, "/notes", Some(json!({ "noteId": id, "title": "Recipe" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Note ID, title, and content are required");

        let (status, _) = browser
            .send(
                Method::PUT,
                "/notes",
                Some(json!({ "noteId": id, "title": "Bread", "content": "flour, water, salt" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = browser.get("/notes").await;
        let notes = listed["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["title"], "Bread");
        assert_eq!(notes[0]["createdAt"], fetched["note"]["createdAt"]);

        let (status, error) = browser.send(Method::DELETE, "/notes", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Note ID is required");

        let (status, _) = browser
            .send(Method::DELETE, &format!("/notes?id={id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, error) = browser.get(&format!("/notes?id={id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "Note not found");

        // deleting again still succeeds
        let (status, _) = browser
            .send(Method::DELETE, &format!("/notes?id={id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = browser.get("/notes").await;
        assert_eq!(listed, json!({ "notes": [] }));
    }

    #[tokio::test]
    async fn updating_a_missing_note_is_404() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);
        let missing = uuid::Uuid::new_v4().to_string();

        let (status, error) = browser
            .send(
                Method::PUT,
                "/notes",
                Some(json!({ "noteId": missing, "title": "t", "content": "c" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "Note not found");
    }

    #[tokio::test]
    async fn anonymous_notes_stay_with_their_session() {
        let (app, _dir) = app(None).await;

        let mut anonymous = Client::new(&app);
        let (_, created) = anonymous
            .post("/notes", json!({ "title": "scratch", "content": "anonymous idea" }))
            .await;
        let anon_note = created["noteId"].as_str().unwrap().to_string();
        let (_, listed) = anonymous.get("/notes").await;
        assert_eq!(listed["notes"].as_array().unwrap().len(), 1);

        let mut other_browser = Client::new(&app);
        other_browser
            .post("/auth/register", json!({ "email": "grace@example.com", "password": "hopper" }))
            .await;
        let (_, listed) = other_browser.get("/notes").await;
        assert_eq!(listed, json!({ "notes": [] }));
        let (status, _) = other_browser.get(&format!("/notes?id={anon_note}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // the account's notes are not visible to the anonymous session either
        other_browser
            .post("/notes", json!({ "title": "account", "content": "signed-in idea" }))
            .await;
        let (_, listed) = anonymous.get("/notes").await;
        let titles: Vec<&str> = listed["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["scratch"]);
    }

    #[tokio::test]
    async fn account_notes_follow_the_account_across_sessions() {
        let (app, _dir) = app(None).await;
        let credentials = json!({ "email": "linus@example.com", "password": "penguin" });

        let mut laptop = Client::new(&app);
        laptop.post("/auth/register", credentials.clone()).await;
        laptop
            .post("/notes", json!({ "title": "kernel", "content": "release notes" }))
            .await;

        let mut phone = Client::new(&app);
        let (status, _) = phone.post("/auth/login", credentials).await;
        assert_eq!(status, StatusCode::OK);
        let (_, listed) = phone.get("/notes").await;
        assert_eq!(listed["notes"][0]["title"], "kernel");
    }

    #[tokio::test]
    async fn tampered_cookie_starts_a_fresh_session() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);
        browser
            .post("/auth/register", json!({ "email": "eve@example.com", "password": "secret1" }))
            .await;

        let cookie = browser.cookie.clone().unwrap();
        browser.cookie = Some(cookie.replacen('=', "=AAAA", 1));
        let (_, me) = browser.get("/auth/me").await;
        assert_eq!(me, json!({ "isAuthenticated": false }));
    }

    #[tokio::test]
    async fn assistant_routes_short_circuit_on_empty_vault() {
        let (app, _dir) = app(Some("should not be called")).await;
        let mut browser = Client::new(&app);

        let (status, error) = browser.post("/search", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Search query is required");

        let (_, search) = browser.post("/search", json!({ "query": "anything" })).await;
        assert_eq!(search["result"], "No notes found in your vault.");

        let (status, error) = browser.post("/ask", json!({ "question": " " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Question is required");

        let (_, ask) = browser.post("/ask", json!({ "question": "why?" })).await;
        assert_eq!(
            ask["answer"],
            "No notes found in your vault. Add some notes first to ask questions."
        );

        let (_, summary) = browser.post("/summarize", json!({})).await;
        assert_eq!(summary["summary"], "No notes found in your vault.");
    }

    #[tokio::test]
    async fn assistant_routes_answer_from_notes() {
        let (app, _dir) = app(Some("Your note mentions sourdough.")).await;
        let mut browser = Client::new(&app);
        browser
            .post("/notes", json!({ "title": "Bread", "content": "sourdough starter" }))
            .await;

        let (_, search) = browser.post("/search", json!({ "query": "bread" })).await;
        assert_eq!(search["result"], "Your note mentions sourdough.");

        let (_, ask) = browser.post("/ask", json!({ "question": "What bread?" })).await;
        assert_eq!(ask["answer"], "Your note mentions sourdough.");

        let (_, summary) = browser.post("/summarize", json!({})).await;
        assert_eq!(summary["summary"], "Your note mentions sourdough.");
    }

    #[tokio::test]
    async fn health_reports_storage_and_config() {
        let (app, _dir) = app(None).await;
        let mut browser = Client::new(&app);

        let (status, health) = browser.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");
        assert_eq!(health["checks"]["storage"], "ok");
        assert_eq!(health["config"]["hasBuilderKey"], true);
        assert_eq!(health["config"]["hasNilAIKey"], false);

        let (status, _) = browser.get("/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let (app, _dir) = app(None).await;
        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
