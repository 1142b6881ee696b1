//! Stub story server for HTTP backend integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chaptersmith_core::backend::{Generation, PromptResponse, StoryBackend};
use chaptersmith_core::chapter::{Chapter, ChapterPatch};
use chaptersmith_core::error::DomainError;
use chaptersmith_core::project::{NewProject, Project, ProjectId};
use chaptersmith_http::HttpBackend;
use chaptersmith_http::client::CORRELATION_HEADER;
use chaptersmith_test_support::ScriptedBackend;
use tokio::net::TcpListener;
use uuid::Uuid;

/// A server that serves the story API from a `ScriptedBackend` and records
/// the correlation ids it receives.
pub struct Stub {
    pub backend: ScriptedBackend,
    pub correlation_ids: Mutex<Vec<String>>,
}

impl Stub {
    fn observe(&self, headers: &HeaderMap) -> Uuid {
        let raw = headers
            .get(CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        self.correlation_ids.lock().unwrap().push(raw.clone());
        Uuid::parse_str(&raw).unwrap_or_else(|_| Uuid::nil())
    }
}

type Shared = Arc<Stub>;

/// Maps backend errors to the server's `{"detail": ...}` error bodies.
pub struct StubError(DomainError);

impl From<DomainError> for StubError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            DomainError::Backend { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

async fn list_projects(
    State(stub): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<Project>>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(stub.backend.list_projects(id).await?))
}

async fn create_project(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewProject>,
) -> Result<Json<Project>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(stub.backend.create_project(id, &body).await?))
}

async fn delete_project(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, StubError> {
    let id = stub.observe(&headers);
    stub.backend
        .delete_project(id, &ProjectId(project_id))
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn initialize_chapters(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Chapter>>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(
        stub.backend
            .initialize_chapters(id, &ProjectId(project_id))
            .await?,
    ))
}

async fn generate_chapter(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path((project_id, number)): Path<(String, u32)>,
) -> Result<Json<Generation>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(
        stub.backend
            .generate_chapter(id, &ProjectId(project_id), number)
            .await?,
    ))
}

async fn build_prompt(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path((project_id, number)): Path<(String, u32)>,
) -> Result<Json<PromptResponse>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(
        stub.backend
            .build_prompt(id, &ProjectId(project_id), number)
            .await?,
    ))
}

async fn update_chapter(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path((project_id, number)): Path<(String, u32)>,
    Json(patch): Json<ChapterPatch>,
) -> Result<Json<Chapter>, StubError> {
    let id = stub.observe(&headers);
    Ok(Json(
        stub.backend
            .update_chapter(id, &ProjectId(project_id), number, &patch)
            .await?,
    ))
}

/// The story API routes, backed by `stub`.
pub fn stub_router(stub: Shared) -> Router {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", axum::routing::delete(delete_project))
        .route("/api/projects/{id}/chapters/init", post(initialize_chapters))
        .route(
            "/api/projects/{id}/chapters/{number}/generate",
            post(generate_chapter),
        )
        .route(
            "/api/projects/{id}/chapters/{number}/prompt",
            post(build_prompt),
        )
        .route("/api/projects/{id}/chapters/{number}", patch(update_chapter))
        .with_state(stub)
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start a stub server over `backend` and return a client pointed at it.
pub async fn start(backend: ScriptedBackend) -> (HttpBackend, Arc<Stub>) {
    let stub = Arc::new(Stub {
        backend,
        correlation_ids: Mutex::new(Vec::new()),
    });
    let base_url = serve(stub_router(stub.clone())).await;
    (client(&base_url), stub)
}

/// A client for `base_url` with a short timeout.
pub fn client(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
}
