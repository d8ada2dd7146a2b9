//! Bounded history of emitted commentary.

use std::collections::VecDeque;

/// Default number of retained commentary strings.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Bounded FIFO of previously emitted commentary strings.
///
/// Consulted read-only when building a model prompt to discourage
/// repetition; appended-to after every successful generation. The bound is
/// enforced eagerly on every append, never lazily. Each ring is owned
/// exclusively by one pipeline.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<String>,
    cap: usize,
}

impl HistoryRing {
    /// Create a ring with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAP)
    }

    /// Create a ring retaining at most `cap` entries.
    pub fn with_capacity(cap: usize) -> Self {
        Self { entries: VecDeque::with_capacity(cap), cap }
    }

    /// Append a commentary string, evicting the oldest entry on overflow.
    pub fn append(&mut self, text: impl Into<String>) {
        self.entries.push_back(text.into());
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The last `k` entries, most-recent-last.
    pub fn recent(&self, k: usize) -> Vec<&str> {
        let skip = self.entries.len().saturating_sub(k);
        self.entries.iter().skip(skip).map(String::as_str).collect()
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-enforce the bound and release slack storage.
    ///
    /// The append-time invariant already keeps `len <= cap`; this exists as
    /// a periodic memory bound for long-lived sessions.
    pub fn compact(&mut self) {
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.entries.shrink_to(self.cap);
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}
