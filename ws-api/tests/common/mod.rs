//! Shared helpers for ws-api integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use ws_orchestrator::test_utils::{
    create_git_repository, create_test_db, seed_fixtures_at, Fixtures,
};
use ws_orchestrator::Settings;

pub const DEVFILE: &str = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    attributes:
      ws/inject-editor: true
    container:
      image: quay.io/devfile/universal-developer-image:ubi8-latest
"#;

/// An app over an in-memory database seeded with fixtures whose project
/// repository holds `.devfile.yaml`.
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub fixtures: Fixtures,
    _repo: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let repo = tempfile::tempdir().expect("Failed to create temp dir");
        create_git_repository(repo.path(), &[(".devfile.yaml", DEVFILE)]);

        let pool = create_test_db().await;
        let fixtures = seed_fixtures_at(&pool, &repo.path().display().to_string()).await;
        let app = ws_api::create_app(pool.clone(), Settings::default())
            .await
            .expect("Failed to create test app");

        Self {
            app,
            pool,
            fixtures,
            _repo: repo,
        }
    }

    pub fn create_request_body(&self) -> serde_json::Value {
        serde_json::json!({
            "agent_id": self.fixtures.agent.id,
            "project_id": self.fixtures.project.id,
            "editor": "webide",
            "max_hours_before_termination": 24,
            "desired_state": "Running",
            "devfile_ref": "main",
            "devfile_path": ".devfile.yaml"
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: &serde_json::Value,
        user: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-ws-user", user);
        }

        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user", user);
        }

        let request = builder.body(Body::empty()).unwrap();
        self.send(request).await
    }
}

pub async fn extract_json_body<T>(response: Response<Body>) -> T
where
    T: serde::de::DeserializeOwned,
{
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    serde_json::from_slice(&body).expect("Failed to deserialize JSON")
}
