use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "vendor": state.ai_service.vendor().to_string(),
        "maxUploadBytes": state.upload.max_upload_bytes,
    });
    (StatusCode::OK, Json(body))
}
