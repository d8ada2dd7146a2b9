//! Inbound frame type.

use std::sync::Arc;
use tokio::time::Instant;

/// One discrete inbound binary unit as delimited by the transport.
///
/// This is the fundamental data unit that flows through the system: one
/// audio clip or one image capture. The buffer is immutable; ownership
/// transfers from the session read loop to a pipeline for the duration of
/// `process`.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw container bytes (zero-copy via Arc).
    pub data: Arc<[u8]>,

    /// Arrival instant, captured when the transport handed us the bytes.
    pub received_at: Instant,
}

impl Frame {
    /// Create a frame from raw bytes, stamping the arrival time.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data: data.into(), received_at: Instant::now() }
    }

    /// Byte length of the payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
