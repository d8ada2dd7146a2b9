//! Adaptive stream-multiplexing commentary engine for live media sessions.
//!
//! Colorcast ingests a live, bidirectional binary stream from a single
//! client, classifies each inbound chunk by its magic-number prefix, routes
//! it to the matching analysis pipeline, and emits a generated commentary
//! message back over the same connection.
//!
//! # Features
//!
//! - **Format Sniffing**: content type from container bytes, never from
//!   client-declared metadata
//! - **Adaptive Throttling**: per-pipeline debounce answering every request
//!   from a result cache instead of hard-failing fast pollers
//! - **Bounded History**: recent commentary biases generation away from
//!   repeats
//! - **Guaranteed Teardown**: keepalive cancellation and transport release
//!   on every exit path
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colorcast::{
//!     Capabilities, EngineConfig, FfmpegTranscoder, OpenAiClient, SessionEngine, Transport,
//! };
//!
//! /// Serve one accepted connection until it disconnects.
//! async fn serve(transport: impl Transport, api_key: String) -> colorcast::Result<()> {
//!     let openai = Arc::new(OpenAiClient::new(api_key));
//!     let capabilities = Capabilities {
//!         speech: openai.clone(),
//!         chat: openai.clone(),
//!         vision: openai,
//!         transcoder: Arc::new(FfmpegTranscoder::new()),
//!     };
//!
//!     let engine = SessionEngine::new(transport, capabilities, EngineConfig::default());
//!     engine.run().await
//! }
//! ```

// Core types and error handling
mod cache;
mod config;
mod error;
mod history;
pub mod sniff;
pub mod types;

// Session architecture
pub mod capability;
pub mod pipeline;
pub mod session;
pub mod transport;

// Concrete collaborators
pub mod capabilities;

// Core exports
pub use cache::ResultCache;
pub use config::{EngineConfig, ImagePipelineConfig};
pub use error::{EngineError, Result};
pub use history::{DEFAULT_HISTORY_CAP, HistoryRing};
pub use sniff::{ContentKind, classify};
pub use types::{AnalysisOutcome, ErrorEnvelope, FailureKind, Frame, OutboundMessage};

// Session exports
pub use capability::{Capabilities, ChatMessage, ChatModel, SpeechModel, Transcoder, VisionModel};
pub use pipeline::{AudioPipeline, CameraPipeline, ScreenPipeline};
pub use session::{SessionEngine, SessionState};
pub use transport::{Inbound, Transport};

// Collaborator exports
pub use capabilities::{FfmpegTranscoder, OpenAiClient};
