#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use quiz_extractor::config::Config;
use quiz_extractor::services::ai_service::{AiVendor, AttachmentMode};
use quiz_extractor::{app, AppState};
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const BOUNDARY: &str = "quiz-test-boundary";

/// What the fake vendor replies with, plus every request body it received.
#[derive(Clone)]
pub struct MockVendor {
    pub status: StatusCode,
    pub content: String,
    pub requests: Arc<Mutex<Vec<JsonValue>>>,
    /// Held before answering, to push the client past its timeout.
    pub delay: Duration,
}

impl MockVendor {
    pub fn new(status: StatusCode, content: &str) -> Self {
        Self {
            status,
            content: content.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }
}

async fn completions(
    State(mock): State<MockVendor>,
    Json(body): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    mock.requests.lock().unwrap().push(body);
    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    if !mock.status.is_success() {
        return (mock.status, Json(json!({ "error": { "message": mock.content } })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": mock.content } }]
        })),
    )
}

/// Start a fake chat-completions endpoint and return its URL.
pub async fn spawn_vendor(mock: MockVendor) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(mock);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/chat/completions", addr)
}

pub fn test_config(endpoint: String, vendor: AiVendor) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        ai_vendor: vendor,
        ai_api_key: "sk-test".to_string(),
        ai_api_url: endpoint,
        ai_model: vendor.default_model().to_string(),
        ai_timeout_secs: 5,
        attachment_mode: AttachmentMode::File,
        max_upload_bytes: 1024 * 1024,
        max_pages: 10,
        render_dpi: 150,
        upload_tmp_dir: None,
        json_logs: false,
    }
}

pub fn setup_app(config: &Config) -> Router {
    app(AppState::from_config(config).expect("state"))
}

pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn text_only_body() -> Vec<u8> {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    )
    .into_bytes()
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

pub fn one_page_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n".to_vec()
}
