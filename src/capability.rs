//! Capability traits for external collaborators.
//!
//! The engine treats every external system as an opaque collaborator
//! behind a small async trait: a speech-to-text service, a chat/completion
//! service, a vision-description service, and a media transcoder invoked as
//! a subprocess. Pipelines depend only on these traits; concrete
//! implementations live in [`capabilities`](crate::capabilities) and tests
//! substitute mocks.

use std::path::Path;
use std::sync::Arc;

use crate::Result;

/// Role of a chat message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

/// One message in a completion prompt.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Speech-to-text service.
#[async_trait::async_trait]
pub trait SpeechModel: Send + Sync {
    /// Transcribe the audio file at `path`, biased toward `language`.
    async fn transcribe(&self, path: &Path, language: &str) -> Result<String>;
}

/// Chat/completion service used for commentary generation.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete the prompt, returning the generated text.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

/// Vision-description service.
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    /// Describe a JPEG image, steered by `prompt`. The response is raw
    /// model text; schema parsing happens in the pipeline.
    async fn describe(&self, jpeg: &[u8], prompt: &str) -> Result<String>;
}

/// External media transcoder.
#[async_trait::async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert the container at `input` into the format required by the
    /// speech model, writing the result to `output`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Bundle of capabilities handed to the engine at construction.
#[derive(Clone)]
pub struct Capabilities {
    pub speech: Arc<dyn SpeechModel>,
    pub chat: Arc<dyn ChatModel>,
    pub vision: Arc<dyn VisionModel>,
    pub transcoder: Arc<dyn Transcoder>,
}
