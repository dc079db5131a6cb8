use quiz_extractor::{
    app,
    config::{get_config, init_config},
    AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    if config.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let app_state = AppState::from_config(config)?;
    info!(
        vendor = %config.ai_vendor,
        model = %config.ai_model,
        mode = ?config.attachment_mode,
        max_upload_bytes = config.max_upload_bytes,
        timeout_secs = config.ai_timeout_secs,
        "Configuration loaded"
    );

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
