//! Common test utilities.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use frontdesk::bundle::BundleStore;
use frontdesk::llm::{GenerateRequest, LLMError, TextGenerator};
use frontdesk::router::ResponseRouter;
use frontdesk::server::{self, AppState};
use frontdesk::session::SessionStore;

pub const ADMIN_TOKEN: &str = "rahasia-admin-123";

/// Generator that replays canned results and records every request.
#[derive(Default)]
pub struct ScriptedGenerator {
    results: Mutex<VecDeque<Result<String, LLMError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub fn new(results: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::default(),
        })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError> {
        self.requests.lock().unwrap().push(request);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Write a small but complete clinic bundle into `dir`.
pub fn write_bundle(dir: &Path, settings: &str) {
    let files = [
        ("settings.json", settings),
        (
            "crisis.json",
            r#"{"keywords": ["bunuh diri", "ingin mati"], "message": "Kamu tidak sendiri. Hubungi {{clinic.name}} atau 119."}"#,
        ),
        ("faq.json", r#"{"jam": "Klinik buka 08.00-20.00."}"#),
        ("faq_keys.json", r#"{"jam": ["jam buka", "jam operasional"]}"#),
        ("psy_words.json", r#"["cemas", "tidur", "stres", "anak"]"#),
        ("system_prompt.md", "Kamu asisten {{clinic.name}}."),
        (
            "suggestions.json",
            r#"{"anak": "Psikolog Anak", "klinis": "Psikolog Klinis"}"#,
        ),
        ("closing.txt", "Terima kasih sudah bercerita."),
        (
            "patterns.json",
            r#"{"greeting": "^(halo|hai|hi)\\b", "thanks": "\\bmakasih\\b"}"#,
        ),
    ];
    std::fs::create_dir_all(dir).unwrap();
    for (file, contents) in files {
        std::fs::write(dir.join(file), contents).unwrap();
    }
}

pub const SETTINGS: &str = r#"{
    "max_turns": 5,
    "clinic": {"name": "Klinik Tenang"},
    "admin_enabled": true,
    "admin_token": "rahasia-admin-123"
}"#;

/// A running app over a temporary bundle.
pub struct TestApp {
    pub app: Router,
    pub generator: Arc<ScriptedGenerator>,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.request(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// Build the app over a fresh bundle written with `settings`.
pub async fn test_app_with(
    settings: &str,
    results: impl IntoIterator<Item = &'static str>,
) -> TestApp {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), settings);

    let generator = ScriptedGenerator::new(results);
    let bundles = BundleStore::open(dir.path().to_path_buf()).await;
    let cors_origins = bundles.current().await.settings.cors_origins.clone();
    let state = AppState {
        bundles,
        router: ResponseRouter::new(SessionStore::new(), generator.clone(), "test-model"),
        cors_origins,
        max_connections: 64,
    };

    TestApp {
        app: server::build_app(state, 30),
        generator,
        dir,
    }
}

/// Build the app with default settings and no scripted replies.
pub async fn test_app() -> TestApp {
    test_app_with(SETTINGS, []).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
