//! Concrete capability implementations.

pub mod ffmpeg;
pub mod openai;

pub use ffmpeg::FfmpegTranscoder;
pub use openai::OpenAiClient;
