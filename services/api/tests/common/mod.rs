//! Shared helpers for the integration tests: an app wired to in-memory
//! adapters, a scriptable analysis-provider stub, and raw HTTP plumbing.

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use api_lib::adapters::MemoryStore;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docvault_core::ports::{
    AnalysisRun, AnalysisStatus, KeywordAnalysisService, PortResult, TextExtractor,
};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Extractor stub: treats uploaded bytes as plain text so tests don't need
/// real PDF/DOCX fixtures.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, content: &[u8], _mimetype: &str) -> PortResult<String> {
        Ok(String::from_utf8_lossy(content).into_owned())
    }
}

/// Analysis-provider stub: reports `InProgress` for a configurable number of
/// polls, then completes with a fixed keyword list.
pub struct StubAnalyzer {
    pub keywords: Vec<String>,
    pub polls_until_complete: u32,
    polls: AtomicU32,
}

impl StubAnalyzer {
    pub fn new(keywords: &[&str], polls_until_complete: u32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            polls_until_complete,
            polls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl KeywordAnalysisService for StubAnalyzer {
    async fn submit(&self, _text: &str) -> PortResult<AnalysisRun> {
        Ok(AnalysisRun {
            session_id: "thread_test".into(),
            run_id: "run_test".into(),
        })
    }

    async fn poll(&self, _run: &AnalysisRun) -> PortResult<AnalysisStatus> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        if seen >= self.polls_until_complete {
            Ok(AnalysisStatus::Completed)
        } else {
            Ok(AnalysisStatus::InProgress)
        }
    }

    async fn fetch_keywords(&self, _run: &AnalysisRun) -> PortResult<Vec<String>> {
        Ok(self.keywords.clone())
    }
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        assistant_id: "asst_test".into(),
        poll_interval_ms: 10,
        max_poll_attempts: 50,
        session_active_hours: 24,
        session_idle_days: 14,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Builds the full router over in-memory adapters. The store is returned so
/// tests can seed or inspect persistence directly.
pub fn test_app(analyzer: Arc<dyn KeywordAnalysisService>) -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = Arc::new(AppState {
        auth: Arc::new(store.clone()),
        documents: Arc::new(store.clone()),
        extractor: Arc::new(PlainTextExtractor),
        analyzer,
        config: Arc::new(test_config()),
    });
    (build_router(state), store)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn post_json(
    app: &Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn authed(
    app: &Router,
    method: &str,
    path: &str,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

/// Builds a single-file multipart body; returns (content-type header, body).
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7a3f";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

pub async fn upload(
    app: &Router,
    token: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> (StatusCode, serde_json::Value) {
    let (mime, body) = multipart_body("document", filename, content_type, bytes);
    let req = Request::builder()
        .method("POST")
        .uri("/uploadDocument")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, mime)
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

pub async fn register_and_login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = post_json(
        app,
        "/register",
        serde_json::json!({"email": email, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);

    let (status, body) = post_json(
        app,
        "/login",
        serde_json::json!({"email": email, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["session"].as_str().unwrap().to_string()
}

/// Re-fetches the listing until the named document has keywords, or panics
/// after the deadline. Keyword presence is eventually consistent by design.
pub async fn wait_for_keywords(
    app: &Router,
    token: &str,
    originalname: &str,
) -> Vec<String> {
    for _ in 0..100 {
        let (_, body) = authed(app, "GET", "/getDocuments", token).await;
        if let Some(doc) = body["docs"]
            .as_array()
            .and_then(|docs| docs.iter().find(|d| d["originalname"] == originalname))
        {
            let keywords = doc["keywords"].as_array().unwrap();
            if !keywords.is_empty() {
                return keywords
                    .iter()
                    .map(|k| k.as_str().unwrap().to_string())
                    .collect();
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("keywords for {} never appeared", originalname);
}
