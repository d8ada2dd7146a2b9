//! Camera frame pipeline: decode, describe, comment.

use image::imageops::FilterType;
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{generate_comment, parse_model_json};
use crate::Result;
use crate::cache::ResultCache;
use crate::capability::{ChatModel, VisionModel};
use crate::config::ImagePipelineConfig;
use crate::error::EngineError;
use crate::history::HistoryRing;
use crate::types::{AnalysisOutcome, Frame};

const VISION_PROMPT: &str = "Describe this camera frame. Reply with only a JSON object, \
     no other text, in exactly this shape:\n\
     {\n\
       \"scene_type\": \"kind of scene (person/landscape/object/other)\",\n\
       \"action\": \"movement in the frame (still/moving/other)\",\n\
       \"content\": \"main content, 20 characters or fewer\"\n\
     }";

/// Structured scene descriptors the vision model must return.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraScene {
    pub scene_type: String,
    pub action: String,
    pub content: String,
}

/// Pipeline for JPEG camera captures.
///
/// Frames arrive at display frame rate while the vision call costs
/// hundreds of milliseconds, so computation is debounced through the
/// result cache; excess frames are answered from it.
pub struct CameraPipeline {
    vision: Arc<dyn VisionModel>,
    chat: Arc<dyn ChatModel>,
    cache: ResultCache,
    history: HistoryRing,
    config: ImagePipelineConfig,
    invocations: u64,
    cleanup_every: u64,
}

impl CameraPipeline {
    pub fn new(
        vision: Arc<dyn VisionModel>,
        chat: Arc<dyn ChatModel>,
        config: ImagePipelineConfig,
        history_cap: usize,
        cleanup_every: u64,
    ) -> Self {
        Self {
            vision,
            chat,
            cache: ResultCache::new(Some(config.min_interval)),
            history: HistoryRing::with_capacity(history_cap),
            config,
            invocations: 0,
            cleanup_every,
        }
    }

    /// Process one camera frame; suppressed frames echo the last outcome.
    pub async fn process(&mut self, frame: Frame) -> AnalysisOutcome {
        self.housekeeping();

        let now = frame.received_at;
        if !self.cache.should_compute(now) {
            debug!("Camera frame suppressed inside debounce window");
            return self.cache.suppressed();
        }

        match self.analyze(&frame).await {
            Ok(text) => {
                let outcome = AnalysisOutcome::Success { text };
                self.cache.put(outcome.clone(), now);
                outcome
            }
            Err(e) => {
                // No cache update: a failed attempt must not suppress a
                // legitimately timed retry.
                warn!(error = %e, "Camera pipeline failed");
                AnalysisOutcome::failure(&e)
            }
        }
    }

    async fn analyze(&mut self, frame: &Frame) -> Result<String> {
        let jpeg = self.decode_and_downscale(frame)?;
        let raw = self.vision.describe(&jpeg, VISION_PROMPT).await?;
        let scene: CameraScene = parse_model_json("camera vision response", &raw)?;
        debug!(scene_type = %scene.scene_type, action = %scene.action, "Camera scene parsed");

        let scene_line = format!(
            "Scene: {} ({}). Content: {}",
            scene.scene_type, scene.action, scene.content
        );
        let comment = generate_comment(self.chat.as_ref(), &scene_line, &mut self.history).await;
        Ok(comment)
    }

    /// Decode the raw container into pixels, downscale for the model, and
    /// re-encode as JPEG.
    fn decode_and_downscale(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.len() > self.config.max_image_bytes {
            return Err(EngineError::invalid_input(format!(
                "image payload of {} bytes exceeds limit",
                frame.len()
            )));
        }

        let decoded = image::load_from_memory(&frame.data)
            .map_err(|e| EngineError::invalid_input(format!("undecodable image: {e}")))?;

        let size = self.config.downscale_to;
        let resized = decoded.resize_exact(size, size, FilterType::Triangle);

        let mut jpeg = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .map_err(|e| EngineError::invalid_input(format!("re-encoding failed: {e}")))?;
        Ok(jpeg)
    }

    fn housekeeping(&mut self) {
        self.invocations += 1;
        if self.invocations > self.cleanup_every {
            self.history.compact();
            self.invocations = 0;
        }
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &HistoryRing {
        &self.history
    }
}
