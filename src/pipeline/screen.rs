//! Screen capture pipeline: decode, measure, comment.
//!
//! Screen captures are described locally rather than through the vision
//! model: the descriptors are the frame size, average brightness, and a
//! motion flag derived from the difference against the previous capture.
//! Only the commentary generation talks to an external model, and it is
//! throttled independently of the analysis itself.

use image::GrayImage;
use image::imageops::FilterType;
use std::sync::Arc;
use tracing::{debug, warn};

use super::generate_comment;
use crate::Result;
use crate::cache::ResultCache;
use crate::capability::ChatModel;
use crate::config::ImagePipelineConfig;
use crate::error::EngineError;
use crate::history::HistoryRing;
use crate::types::{AnalysisOutcome, Frame};

/// Mean per-pixel delta above which a capture counts as motion.
const MOTION_THRESHOLD: f64 = 10.0;

/// Locally derived descriptors for one screen capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenScene {
    pub width: u32,
    pub height: u32,
    pub average_brightness: f64,
    pub motion_detected: bool,
}

/// Pipeline for PNG screen captures.
pub struct ScreenPipeline {
    chat: Arc<dyn ChatModel>,
    cache: ResultCache,
    comment_cache: ResultCache,
    history: HistoryRing,
    previous: Option<GrayImage>,
    config: ImagePipelineConfig,
    invocations: u64,
    cleanup_every: u64,
}

impl ScreenPipeline {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        config: ImagePipelineConfig,
        comment_interval: std::time::Duration,
        history_cap: usize,
        cleanup_every: u64,
    ) -> Self {
        Self {
            chat,
            cache: ResultCache::new(Some(config.min_interval)),
            comment_cache: ResultCache::new(Some(comment_interval)),
            history: HistoryRing::with_capacity(history_cap),
            previous: None,
            config,
            invocations: 0,
            cleanup_every,
        }
    }

    /// Process one screen capture; suppressed frames echo the last outcome.
    pub async fn process(&mut self, frame: Frame) -> AnalysisOutcome {
        self.housekeeping();

        let now = frame.received_at;
        if !self.cache.should_compute(now) {
            debug!("Screen frame suppressed inside debounce window");
            return self.cache.suppressed();
        }

        match self.analyze(&frame).await {
            Ok(text) => {
                let outcome = AnalysisOutcome::Success { text };
                self.cache.put(outcome.clone(), now);
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Screen pipeline failed");
                AnalysisOutcome::failure(&e)
            }
        }
    }

    async fn analyze(&mut self, frame: &Frame) -> Result<String> {
        let scene = self.measure(frame)?;
        debug!(
            brightness = scene.average_brightness,
            motion = scene.motion_detected,
            "Screen capture measured"
        );

        // Commentary has its own, slower debounce: screen content changes
        // less often than capture rate, and comments grow stale slower
        // than the measurements do.
        let now = frame.received_at;
        let comment = if self.comment_cache.should_compute(now) {
            let scene_line = format!(
                "A {}x{} screen capture, average brightness {:.0}, {}",
                scene.width,
                scene.height,
                scene.average_brightness,
                if scene.motion_detected { "with movement on screen" } else { "mostly static" },
            );
            let comment =
                generate_comment(self.chat.as_ref(), &scene_line, &mut self.history).await;
            self.comment_cache
                .put(AnalysisOutcome::Success { text: comment.clone() }, now);
            comment
        } else {
            self.comment_cache
                .suppressed()
                .text()
                .unwrap_or_default()
                .to_string()
        };

        Ok(comment)
    }

    /// Decode the capture and derive scene descriptors from pixels.
    fn measure(&mut self, frame: &Frame) -> Result<ScreenScene> {
        if frame.len() > self.config.max_image_bytes {
            return Err(EngineError::invalid_input(format!(
                "image payload of {} bytes exceeds limit",
                frame.len()
            )));
        }

        let decoded = image::load_from_memory(&frame.data)
            .map_err(|e| EngineError::invalid_input(format!("undecodable image: {e}")))?;

        // Downscale to a fixed 16:9 working size so frame-to-frame deltas
        // are always comparable.
        let width = self.config.downscale_to;
        let height = width * 9 / 16;
        let gray = decoded.resize_exact(width, height, FilterType::Triangle).into_luma8();

        let average_brightness = mean_luma(&gray);
        let motion_detected = match &self.previous {
            Some(previous) => mean_abs_diff(previous, &gray) > MOTION_THRESHOLD,
            None => false,
        };
        self.previous = Some(gray);

        Ok(ScreenScene { width, height, average_brightness, motion_detected })
    }

    fn housekeeping(&mut self) {
        self.invocations += 1;
        if self.invocations > self.cleanup_every {
            self.history.compact();
            self.invocations = 0;
        }
    }
}

fn mean_luma(image: &GrayImage) -> f64 {
    let sum: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    sum as f64 / f64::from(image.width() * image.height())
}

fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let sum: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| u64::from(pa.0[0].abs_diff(pb.0[0])))
        .sum();
    sum as f64 / f64::from(a.width() * a.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ChatMessage;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, advance};

    struct CountingChat {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChatModel for CountingChat {
        async fn complete(&self, _messages: &[ChatMessage], _max_tokens: u32) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("C{n}"))
        }
    }

    fn png_frame(luma: u8) -> Frame {
        let img = image::GrayImage::from_pixel(32, 18, image::Luma([luma]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        Frame::new(bytes)
    }

    fn pipeline(chat: Arc<CountingChat>) -> ScreenPipeline {
        ScreenPipeline::new(
            chat,
            ImagePipelineConfig { downscale_to: 640, ..Default::default() },
            Duration::from_secs(3),
            10,
            100,
        )
    }

    #[test]
    fn motion_requires_a_previous_frame_and_a_real_delta() {
        let chat = Arc::new(CountingChat { calls: AtomicUsize::new(0) });
        let mut p = pipeline(chat);

        let first = p.measure(&png_frame(0)).unwrap();
        assert!(!first.motion_detected, "first frame has nothing to diff against");
        assert_eq!(first.average_brightness, 0.0);

        let same = p.measure(&png_frame(0)).unwrap();
        assert!(!same.motion_detected);

        let changed = p.measure(&png_frame(255)).unwrap();
        assert!(changed.motion_detected);
        assert!(changed.average_brightness > 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn commentary_is_throttled_independently_of_analysis() {
        let chat = Arc::new(CountingChat { calls: AtomicUsize::new(0) });
        let mut p = pipeline(chat.clone());

        // t=0: analysis + comment
        let first = p.process(png_frame(10)).await;
        assert_eq!(first, AnalysisOutcome::Success { text: "C1".into() });

        // t=1.5: analysis recomputes, comment still inside its 3s window
        advance(Duration::from_millis(1500)).await;
        let second = p.process(png_frame(200)).await;
        assert_eq!(second, AnalysisOutcome::Success { text: "C1".into() });
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1, "chat model called once so far");

        // t=3.5: comment window reopened
        advance(Duration::from_millis(2000)).await;
        let third = p.process(png_frame(10)).await;
        assert_eq!(third, AnalysisOutcome::Success { text: "C2".into() });
        assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_debounce_suppresses_fast_captures() {
        let chat = Arc::new(CountingChat { calls: AtomicUsize::new(0) });
        let mut p = pipeline(chat);

        let first = p.process(png_frame(10)).await;
        assert_eq!(first, AnalysisOutcome::Success { text: "C1".into() });

        advance(Duration::from_millis(300)).await;
        let second = p.process(png_frame(10)).await;
        assert_eq!(second, AnalysisOutcome::Suppressed { text: "C1".into() });
    }

    #[tokio::test]
    async fn undecodable_capture_is_invalid_input() {
        let chat = Arc::new(CountingChat { calls: AtomicUsize::new(0) });
        let mut p = pipeline(chat);
        let mut data = vec![0x89, 0x50, 0x4E, 0x47];
        data.extend_from_slice(b"not actually a png");
        let outcome = p.process(Frame::new(data)).await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::Failure { kind: crate::types::FailureKind::InvalidInput, .. }
        ));
    }
}
