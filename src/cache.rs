//! Per-pipeline debounce cache.
//!
//! Image frames arrive at display frame rate while a model call costs
//! hundreds of milliseconds and real money. The cache answers two
//! questions: "is a fresh computation allowed now" and "what do I return
//! instead". It is a debounce, not a TTL cache: stored data never expires
//! on its own, so a throttled client always gets the last real outcome
//! back rather than a hard failure.

use tokio::time::{Duration, Instant};

use crate::types::{AnalysisOutcome, SUPPRESSED_PLACEHOLDER};

/// Debounce state for one pipeline instance.
///
/// The first call on a fresh cache always permits computation; the absence
/// of a prior timestamp is a first-class `None`, not a runtime existence
/// check. `put` is only ever called after a successful computation, so a
/// failed attempt never suppresses a legitimately timed retry.
#[derive(Debug, Clone)]
pub struct ResultCache {
    last: Option<AnalysisOutcome>,
    last_at: Option<Instant>,
    min_interval: Option<Duration>,
}

impl ResultCache {
    /// Create a cache with the given minimum re-computation interval.
    ///
    /// `None` disables throttling entirely: every call computes. Audio
    /// clips are discrete user utterances and use this mode.
    pub fn new(min_interval: Option<Duration>) -> Self {
        Self { last: None, last_at: None, min_interval }
    }

    /// Whether a fresh computation is allowed at `now`.
    pub fn should_compute(&self, now: Instant) -> bool {
        match (self.min_interval, self.last_at) {
            (Some(interval), Some(last_at)) => now.duration_since(last_at) >= interval,
            // No interval configured, or nothing computed yet
            _ => true,
        }
    }

    /// Store an outcome computed at `now`.
    pub fn put(&mut self, outcome: AnalysisOutcome, now: Instant) {
        debug_assert!(
            self.last_at.is_none_or(|prev| now >= prev),
            "cache timestamps must be monotonically non-decreasing"
        );
        self.last = Some(outcome);
        self.last_at = Some(now);
    }

    /// The last stored outcome, if any.
    pub fn get(&self) -> Option<&AnalysisOutcome> {
        self.last.as_ref()
    }

    /// Build the `Suppressed` outcome answering a throttled request.
    ///
    /// Echoes the last good text, or the sentinel placeholder when nothing
    /// has been computed yet, so the client never receives a hard failure
    /// purely for polling too fast.
    pub fn suppressed(&self) -> AnalysisOutcome {
        let text = self
            .last
            .as_ref()
            .and_then(|outcome| outcome.text())
            .unwrap_or(SUPPRESSED_PLACEHOLDER)
            .to_string();
        AnalysisOutcome::Suppressed { text }
    }
}
