//! OpenAI-backed model capabilities.
//!
//! One HTTP client implements all three model traits: Whisper for speech,
//! chat completions for commentary, and the vision-capable chat endpoint
//! for image description. Quota responses (HTTP 429) are distinguished
//! from other transport/auth failures so the pipelines can tag outcomes as
//! `rate_limited` rather than generic `api_error`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::capability::{ChatMessage, ChatModel, SpeechModel, VisionModel};
use crate::error::EngineError;
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const SPEECH_MODEL: &str = "whisper-1";
const CHAT_MODEL: &str = "gpt-3.5-turbo";
const VISION_MODEL: &str = "gpt-4o-mini";
const VISION_MAX_TOKENS: u32 = 150;
const VISION_TEMPERATURE: f64 = 0.3;

/// OpenAI API client implementing the model capability traits.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (proxies, test servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Map an HTTP response status to the engine error taxonomy.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = format!("HTTP {status}: {}", body.chars().take(200).collect::<String>());
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(%status, "Model API rate limit hit");
            Err(EngineError::rate_limited(detail))
        } else {
            warn!(%status, "Model API request failed");
            Err(EngineError::api_error(detail))
        }
    }

    fn send_error(err: reqwest::Error) -> EngineError {
        EngineError::api_error_with_source("request failed", Box::new(err))
    }

    async fn chat_request(&self, body: serde_json::Value) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::send_error)?;

        let parsed: CompletionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(Self::send_error)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| EngineError::api_error("completion response carried no content"))
    }
}

#[async_trait::async_trait]
impl SpeechModel for OpenAiClient {
    async fn transcribe(&self, path: &Path, language: &str) -> Result<String> {
        debug!(path = %path.display(), language, "Transcribing audio clip");
        let audio = tokio::fs::read(path).await?;

        let file_name = path
            .file_name()
            .map_or_else(|| "clip.mp3".to_string(), |n| n.to_string_lossy().into_owned());
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| EngineError::api_error_with_source("invalid upload part", Box::new(e)))?;
        let form = reqwest::multipart::Form::new()
            .text("model", SPEECH_MODEL)
            .text("language", language.to_string())
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(Self::send_error)?;

        let parsed: TranscriptionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(Self::send_error)?;

        Ok(parsed.text)
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let messages: Vec<_> = messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
            .collect();
        self.chat_request(serde_json::json!({
            "model": CHAT_MODEL,
            "messages": messages,
            "max_tokens": max_tokens,
        }))
        .await
    }
}

#[async_trait::async_trait]
impl VisionModel for OpenAiClient {
    async fn describe(&self, jpeg: &[u8], prompt: &str) -> Result<String> {
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg));
        self.chat_request(serde_json::json!({
            "model": VISION_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": data_url, "detail": "auto"}}
                ]
            }],
            "max_tokens": VISION_MAX_TOKENS,
            "temperature": VISION_TEMPERATURE,
        }))
        .await
    }
}
