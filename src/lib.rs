pub mod config;
pub mod error;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod services;
pub mod store;
pub mod views;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::ai_service::{AIService, AttachmentMode};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_upload_bytes: usize,
    pub attachment_mode: AttachmentMode,
    pub max_pages: usize,
    pub render_dpi: u32,
    /// Parent of per-upload workspaces; the system temp dir when unset.
    pub temp_root: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    pub ai_service: AIService,
    pub upload: UploadSettings,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.ai_timeout_secs);
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let ai_service = AIService::new(
            http_client,
            config.ai_vendor,
            config.ai_api_key.clone(),
            config.ai_api_url.clone(),
            config.ai_model.clone(),
            timeout,
        );

        Ok(Self {
            ai_service,
            upload: UploadSettings {
                max_upload_bytes: config.max_upload_bytes,
                attachment_mode: config.attachment_mode,
                max_pages: config.max_pages,
                render_dpi: config.render_dpi,
                temp_root: config.upload_tmp_dir.clone(),
            },
        })
    }
}

pub fn app(state: AppState) -> Router {
    let body_limit = state.upload.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(routes::index::index))
        .route("/health", get(routes::health::health))
        .route("/api/upload", post(routes::upload::upload_document))
        .route("/api/questions/render", post(routes::questions::render_questions))
        .route("/api/questions/reorder", post(routes::questions::reorder_questions))
        .route("/api/questions/dispatch", post(routes::questions::dispatch_action))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}
