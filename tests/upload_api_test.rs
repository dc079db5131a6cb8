mod common;

use axum::http::StatusCode;
use common::*;
use quiz_extractor::services::ai_service::AiVendor;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

fn vendor_replying(content: &str) -> MockVendor {
    MockVendor::new(StatusCode::OK, content)
}

fn leftover_entries(root: &Path) -> usize {
    std::fs::read_dir(root).unwrap().count()
}

#[tokio::test]
async fn fenced_reply_is_returned_as_questions() {
    let mock = vendor_replying(
        "```json\n[{\"index\":1,\"question\":\"$1+1=?$\",\"options\":[\"1\",\"2\",\"3\",\"4\"],\"answer\":\"b\"}]\n```",
    );
    let requests = mock.requests.clone();
    let endpoint = spawn_vendor(mock).await;
    let app = setup_app(&test_config(endpoint, AiVendor::OpenAi));

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "questions": [{
                "index": 1,
                "question": "$1+1=?$",
                "options": ["1", "2", "3", "4"],
                "answer": "b"
            }]
        })
    );

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 1, "exactly one vendor request per upload");
    assert_eq!(sent[0]["messages"][0]["role"], "system");
    assert_eq!(sent[0]["messages"][1]["content"][1]["type"], "file");
}

#[tokio::test]
async fn prose_reply_yields_500_with_raw_text() {
    let prose = "I'm sorry, but I couldn't find any questions in this document.";
    let endpoint = spawn_vendor(vendor_replying(prose)).await;
    let app = setup_app(&test_config(endpoint, AiVendor::DeepSeek));

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert_eq!(body["aiResponse"], prose);
}

#[tokio::test]
async fn missing_file_yields_400() {
    let endpoint = spawn_vendor(vendor_replying("[]")).await;
    let app = setup_app(&test_config(endpoint, AiVendor::DeepSeek));

    let (status, body) = send(app, upload_request(text_only_body())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file uploaded" }));
}

#[tokio::test]
async fn empty_file_part_yields_400() {
    let mock = vendor_replying("[]");
    let requests = mock.requests.clone();
    let endpoint = spawn_vendor(mock).await;
    let app = setup_app(&test_config(endpoint, AiVendor::DeepSeek));

    // What a browser posts when the file input was left empty.
    let body = multipart_body("pdf", "", "application/octet-stream", b"");
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file uploaded" }));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_media_type_is_rejected_before_vendor_call() {
    let mock = vendor_replying("[]");
    let requests = mock.requests.clone();
    let endpoint = spawn_vendor(mock).await;
    let app = setup_app(&test_config(endpoint, AiVendor::DeepSeek));

    let body = multipart_body("file", "notes.txt", "text/plain", b"hello");
    let (status, _) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let endpoint = spawn_vendor(vendor_replying("[]")).await;
    let mut config = test_config(endpoint, AiVendor::DeepSeek);
    config.max_upload_bytes = 16;
    let app = setup_app(&config);

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, _) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn vendor_error_surfaces_as_500_with_details() {
    let mock = MockVendor::new(StatusCode::UNAUTHORIZED, "invalid api key");
    let endpoint = spawn_vendor(mock).await;
    let app = setup_app(&test_config(endpoint, AiVendor::OpenAi));

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["error"]["message"], "invalid api key");
}

#[tokio::test]
async fn malformed_entries_are_dropped_and_reported() {
    let reply = r#"Sure! [
        {"index": 1, "question": "২ + ২ = ?", "options": ["3", "4", "5", "6"], "answer": "B"},
        {"index": 2, "question": "missing options", "answer": "a"},
        {"index": 3, "question": "$$\\int_0^1 x\\,dx$$", "options": ["0", "1/2", "1", "2"], "answer": "b"}
    ]"#;
    let endpoint = spawn_vendor(vendor_replying(reply)).await;
    let app = setup_app(&test_config(endpoint, AiVendor::DeepSeek));

    let body = multipart_body("docx", "quiz.docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document", b"PK\x03\x04docx");
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["answer"], "b");
    assert_eq!(questions[1]["index"], 2);
    assert_eq!(body["rejected"][0]["position"], 2);
}

#[tokio::test]
async fn unreachable_vendor_fails_cleanly() {
    let app = setup_app(&test_config(
        "http://127.0.0.1:1/chat/completions".to_string(),
        AiVendor::DeepSeek,
    ));

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn slow_vendor_times_out() {
    let mut mock = vendor_replying("[]");
    mock.delay = Duration::from_secs(3);
    let endpoint = spawn_vendor(mock).await;
    let mut config = test_config(endpoint, AiVendor::DeepSeek);
    config.ai_timeout_secs = 1;
    let app = setup_app(&config);

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(app, upload_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process document");
    assert!(body["details"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn workspace_is_removed_after_failed_uploads() {
    let root = tempfile::tempdir().unwrap();

    let unauthorized = MockVendor::new(StatusCode::UNAUTHORIZED, "invalid api key");
    let endpoint = spawn_vendor(unauthorized).await;
    let mut config = test_config(endpoint, AiVendor::OpenAi);
    config.upload_tmp_dir = Some(root.path().to_path_buf());
    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, _) = send(setup_app(&config), upload_request(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(leftover_entries(root.path()), 0);

    let endpoint = spawn_vendor(vendor_replying("No questions here.")).await;
    let mut config = test_config(endpoint, AiVendor::DeepSeek);
    config.upload_tmp_dir = Some(root.path().to_path_buf());
    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, body) = send(setup_app(&config), upload_request(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["aiResponse"], "No questions here.");
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn workspace_is_removed_after_success() {
    let root = tempfile::tempdir().unwrap();
    let endpoint = spawn_vendor(vendor_replying(
        r#"[{"question":"x","options":["a","b","c","d"],"answer":"a"}]"#,
    ))
    .await;
    let mut config = test_config(endpoint, AiVendor::OpenAi);
    config.upload_tmp_dir = Some(root.path().to_path_buf());

    let body = multipart_body("pdf", "quiz.pdf", "application/pdf", &one_page_pdf());
    let (status, _) = send(setup_app(&config), upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(leftover_entries(root.path()), 0);
}
