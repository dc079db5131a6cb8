use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const SYSTEM_PROMPT: &str = r#"You are an assistant that extracts multiple-choice math questions from exam documents.
The documents may be written in English, Bengali, or a mix of both. Keep every question and option in its original language.

Rules:
1. Extract every question in the order it appears.
2. Each question has exactly 4 options, in the order they appear (a, b, c, d).
3. Write all mathematics with LaTeX: $...$ for inline math and $$...$$ for display math.
4. "answer" is the letter of the correct option (a, b, c or d). If the document marks no answer, solve the question and give the correct letter.
5. Respond with a JSON array only. No commentary, no markdown."#;

const EXTRACTION_PROMPT: &str = r#"Extract all questions from this document and return them in this exact format:
[
  {
    "index": 1,
    "question": "What is $2 + 2$?",
    "options": ["3", "4", "5", "6"],
    "answer": "b"
  }
]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiVendor {
    DeepSeek,
    OpenAi,
}

impl AiVendor {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            AiVendor::DeepSeek => "https://api.deepseek.com/chat/completions",
            AiVendor::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            AiVendor::DeepSeek => "deepseek-chat",
            AiVendor::OpenAi => "gpt-4o",
        }
    }
}

impl FromStr for AiVendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(AiVendor::DeepSeek),
            "openai" => Ok(AiVendor::OpenAi),
            other => Err(Error::Config(format!("Unknown AI_VENDOR: {}", other))),
        }
    }
}

impl fmt::Display for AiVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiVendor::DeepSeek => write!(f, "deepseek"),
            AiVendor::OpenAi => write!(f, "openai"),
        }
    }
}

/// Whether documents are sent as rendered page images or as the raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMode {
    Images,
    File,
}

impl FromStr for AttachmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(AttachmentMode::Images),
            "file" => Ok(AttachmentMode::File),
            other => Err(Error::Config(format!("Unknown ATTACHMENT_MODE: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Attachment {
    /// Base64-encoded PNG pages.
    PageImages(Vec<String>),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
    vendor: AiVendor,
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl AIService {
    pub fn new(
        client: Client,
        vendor: AiVendor,
        api_key: String,
        endpoint: String,
        model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            vendor,
            api_key,
            endpoint,
            model,
            timeout,
        }
    }

    pub fn vendor(&self) -> AiVendor {
        self.vendor
    }

    /// Send one extraction request and return the model's raw message text.
    pub async fn extract_questions(&self, attachment: &Attachment) -> Result<String> {
        let payload = self.build_payload(attachment);
        tracing::info!(
            vendor = %self.vendor,
            model = %self.model,
            "Sending extraction request to AI vendor"
        );
        let text = self.chat_completion(payload).await?;
        tracing::info!(chars = text.len(), "AI response received");
        Ok(text)
    }

    pub fn build_payload(&self, attachment: &Attachment) -> JsonValue {
        let mut content: Vec<JsonValue> = vec![json!({
            "type": "text",
            "text": EXTRACTION_PROMPT,
        })];

        match attachment {
            Attachment::PageImages(pages) => {
                for (i, image_base64) in pages.iter().enumerate() {
                    tracing::debug!("Adding page {} to vision request", i + 1);
                    content.push(json!({
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/png;base64,{}", image_base64),
                            "detail": "high"
                        }
                    }));
                }
            }
            Attachment::File {
                file_name,
                mime,
                bytes,
            } => {
                let encoded = BASE64.encode(bytes);
                match self.vendor {
                    AiVendor::OpenAi => content.push(json!({
                        "type": "file",
                        "file": {
                            "filename": file_name,
                            "file_data": format!("data:{};base64,{}", mime, encoded),
                        }
                    })),
                    AiVendor::DeepSeek => content.push(json!({
                        "type": "text",
                        "text": format!(
                            "Document \"{}\" ({}), base64-encoded:\n{}",
                            file_name, mime, encoded
                        ),
                    })),
                }
            }
        }

        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": content}
            ],
            "temperature": 0.1,
            "stream": false
        })
    }

    async fn chat_completion(&self, payload: JsonValue) -> Result<String> {
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::error!(status = %status, "AI vendor returned an error");
            let details = serde_json::from_str::<JsonValue>(&text)
                .unwrap_or_else(|_| JsonValue::String(text));
            return Err(Error::VendorRequestFailed {
                message: format!("{} API error {}", self.vendor, status),
                details: Some(details),
            });
        }

        let body: JsonValue = res.json().await.map_err(|e| self.transport_error(e))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::VendorRequestFailed {
                message: format!("Invalid {} response format", self.vendor),
                details: Some(body.clone()),
            })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            tracing::error!(timeout = ?self.timeout, "AI vendor request timed out");
            Error::VendorTimeout(self.timeout.as_secs())
        } else {
            tracing::error!(error = %err, "AI vendor request failed");
            err.into()
        }
    }
}
