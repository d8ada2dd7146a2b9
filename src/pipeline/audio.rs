//! Audio clip pipeline: persist, transcode, transcribe.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::cache::ResultCache;
use crate::capability::{SpeechModel, Transcoder};
use crate::error::EngineError;
use crate::types::{AnalysisOutcome, Frame};

/// Pipeline for WebM audio clips.
///
/// Every clip is a discrete user utterance, so this pipeline carries no
/// minimum re-computation interval: the cache always permits a fresh
/// computation and exists only to answer the uniform suppressed path.
pub struct AudioPipeline {
    speech: Arc<dyn SpeechModel>,
    transcoder: Arc<dyn Transcoder>,
    cache: ResultCache,
    language: String,
}

impl AudioPipeline {
    pub fn new(
        speech: Arc<dyn SpeechModel>,
        transcoder: Arc<dyn Transcoder>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            speech,
            transcoder,
            cache: ResultCache::new(None),
            language: language.into(),
        }
    }

    /// Process one audio clip through transcode and transcription.
    pub async fn process(&mut self, frame: Frame) -> AnalysisOutcome {
        let now = frame.received_at;
        if !self.cache.should_compute(now) {
            return self.cache.suppressed();
        }

        match self.transcribe_clip(&frame).await {
            Ok(text) => {
                info!(chars = text.len(), "Audio clip transcribed");
                let outcome = AnalysisOutcome::Success { text };
                self.cache.put(outcome.clone(), now);
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Audio pipeline failed");
                AnalysisOutcome::failure(&e)
            }
        }
    }

    async fn transcribe_clip(&self, frame: &Frame) -> Result<String> {
        if frame.is_empty() {
            return Err(EngineError::invalid_input("empty audio clip"));
        }

        // All artifacts live in one scoped directory, removed on every
        // exit path when the guard drops.
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("clip.webm");
        let output = workdir.path().join("clip.mp3");

        tokio::fs::write(&input, frame.data.as_ref()).await?;
        debug!(bytes = frame.len(), "Persisted audio clip for transcoding");

        self.transcoder.transcode(&input, &output).await?;
        let text = self.speech.transcribe(&output, &self.language).await?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    struct StubSpeech {
        reply: Result<String, &'static str>,
    }

    #[async_trait::async_trait]
    impl SpeechModel for StubSpeech {
        async fn transcribe(&self, path: &Path, language: &str) -> Result<String> {
            assert_eq!(language, "ja");
            assert!(path.exists(), "transcoded file should exist when transcription runs");
            self.reply.clone().map_err(EngineError::api_error)
        }
    }

    /// Copies input to output, recording the workdir it saw.
    struct StubTranscoder {
        fail: bool,
        seen_dir: Mutex<Option<PathBuf>>,
    }

    #[async_trait::async_trait]
    impl Transcoder for StubTranscoder {
        async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
            *self.seen_dir.lock().unwrap() = input.parent().map(Path::to_path_buf);
            if self.fail {
                return Err(EngineError::conversion("ffmpeg exited with status 1"));
            }
            tokio::fs::copy(input, output).await?;
            Ok(())
        }
    }

    fn webm_frame() -> Frame {
        let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
        data.extend_from_slice(b"fake-webm-payload");
        Frame::new(data)
    }

    #[tokio::test]
    async fn successful_clip_transcribes() {
        let transcoder =
            Arc::new(StubTranscoder { fail: false, seen_dir: Mutex::new(None) });
        let mut pipeline = AudioPipeline::new(
            Arc::new(StubSpeech { reply: Ok("hello there".into()) }),
            transcoder.clone(),
            "ja",
        );

        let outcome = pipeline.process(webm_frame()).await;
        assert_eq!(outcome, AnalysisOutcome::Success { text: "hello there".into() });

        // Scoped artifacts are gone once process returns
        let dir = transcoder.seen_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists(), "temp workdir should be removed");
    }

    #[tokio::test]
    async fn transcoder_failure_yields_conversion_error_and_cleans_up() {
        let transcoder =
            Arc::new(StubTranscoder { fail: true, seen_dir: Mutex::new(None) });
        let mut pipeline = AudioPipeline::new(
            Arc::new(StubSpeech { reply: Ok("unreachable".into()) }),
            transcoder.clone(),
            "ja",
        );

        let outcome = pipeline.process(webm_frame()).await;
        match outcome {
            AnalysisOutcome::Failure { kind, .. } => {
                assert_eq!(kind, crate::types::FailureKind::ConversionError);
            }
            other => panic!("expected conversion failure, got {other:?}"),
        }

        let dir = transcoder.seen_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists(), "temp workdir should be removed on failure too");
    }

    #[tokio::test]
    async fn every_clip_is_processed_without_throttling() {
        let transcoder =
            Arc::new(StubTranscoder { fail: false, seen_dir: Mutex::new(None) });
        let mut pipeline = AudioPipeline::new(
            Arc::new(StubSpeech { reply: Ok("again".into()) }),
            transcoder,
            "ja",
        );

        // Back-to-back clips both compute; no Suppressed outcome for audio
        let first = pipeline.process(webm_frame()).await;
        let second = pipeline.process(webm_frame()).await;
        assert!(matches!(first, AnalysisOutcome::Success { .. }));
        assert!(matches!(second, AnalysisOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn speech_failure_is_tagged_api_error() {
        let transcoder =
            Arc::new(StubTranscoder { fail: false, seen_dir: Mutex::new(None) });
        let mut pipeline = AudioPipeline::new(
            Arc::new(StubSpeech { reply: Err("whisper down") }),
            transcoder,
            "ja",
        );

        let outcome = pipeline.process(webm_frame()).await;
        match outcome {
            AnalysisOutcome::Failure { kind, message } => {
                assert_eq!(kind, crate::types::FailureKind::ApiError);
                assert!(message.contains("whisper down"));
            }
            other => panic!("expected api failure, got {other:?}"),
        }
    }
}
