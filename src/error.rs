use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No file uploaded")]
    NoFileAttached,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("File exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },

    #[error("AI request failed: {message}")]
    VendorRequestFailed {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("AI request timed out after {0} seconds")]
    VendorTimeout(u64),

    #[error("Failed to parse AI response: {reason}")]
    MalformedModelOutput { reason: String, ai_response: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Document conversion failed: {0}")]
    Conversion(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn malformed(reason: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Error::MalformedModelOutput {
            reason: reason.into(),
            ai_response: ai_response.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::VendorRequestFailed {
            message: "Failed to reach AI vendor".to_string(),
            details: Some(JsonValue::String(err.to_string())),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let (status, body) = match self {
            Error::NoFileAttached => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "error": message }))
            }
            Error::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": message }))
            }
            Error::Multipart(err) => {
                let status = err.status();
                (status, json!({ "error": err.body_text() }))
            }
            Error::VendorRequestFailed { message, details } => {
                let mut body = json!({ "error": "Failed to process document", "message": message });
                if let Some(details) = details {
                    body["details"] = details;
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            Error::VendorTimeout(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to process document", "details": message }),
            ),
            Error::MalformedModelOutput { reason, ai_response } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to parse AI response",
                    "details": reason,
                    "aiResponse": ai_response,
                }),
            ),
            Error::Conversion(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to process document", "details": msg }),
            ),
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                tracing::error!(error = %message, "Internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
