use crate::error::{Error, Result};
use crate::services::ai_service::{AiVendor, AttachmentMode};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub ai_vendor: AiVendor,
    pub ai_api_key: String,
    pub ai_api_url: String,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub attachment_mode: AttachmentMode,
    pub max_upload_bytes: usize,
    pub max_pages: usize,
    pub render_dpi: u32,
    pub upload_tmp_dir: Option<PathBuf>,
    pub json_logs: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let ai_vendor: AiVendor = get_env_or("AI_VENDOR", "deepseek").parse()?;
        let ai_api_url = env::var("AI_API_URL")
            .unwrap_or_else(|_| ai_vendor.default_endpoint().to_string());
        let ai_model =
            env::var("AI_MODEL").unwrap_or_else(|_| ai_vendor.default_model().to_string());

        let config = Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:3000"),
            ai_vendor,
            ai_api_key: get_env("AI_API_KEY")?,
            ai_api_url,
            ai_model,
            ai_timeout_secs: get_env_parse_or("AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            attachment_mode: get_env_or("ATTACHMENT_MODE", "images").parse()?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_pages: get_env_parse_or("MAX_PAGES", 10)?,
            render_dpi: get_env_parse_or("RENDER_DPI", 150)?,
            upload_tmp_dir: env::var("UPLOAD_TMP_DIR").ok().map(PathBuf::from),
            json_logs: get_env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        };

        if config.max_upload_bytes == 0 {
            return Err(Error::Config("MAX_UPLOAD_BYTES must be positive".to_string()));
        }
        if config.max_pages == 0 {
            return Err(Error::Config("MAX_PAGES must be positive".to_string()));
        }
        if config.ai_timeout_secs == 0 {
            return Err(Error::Config("AI_TIMEOUT_SECS must be positive".to_string()));
        }

        Ok(config)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
