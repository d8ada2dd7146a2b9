//! Transport trait for the client connection.
//!
//! The engine speaks to exactly one client over a persistent full-duplex
//! connection. The concrete transport (a websocket in the deployed
//! service) is abstracted behind this trait so the engine can be driven by
//! mocks in tests; implementations adapt their own framing to the
//! [`Inbound`] units and serialize [`OutboundMessage`] values as JSON.

use crate::Result;
use crate::types::OutboundMessage;

/// One inbound unit as delimited by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A binary frame: one audio clip or one image capture.
    Binary(Vec<u8>),

    /// A plain text control message. Logged, never dispatched.
    Text(String),

    /// The client signalled an orderly disconnect.
    Disconnect,
}

/// Persistent full-duplex connection to one client.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Receive the next inbound unit.
    ///
    /// Returns:
    /// - `Ok(Some(inbound))` - a unit arrived
    /// - `Ok(None)` - the remote end closed the connection
    /// - `Err(e)` - unrecoverable transport failure
    async fn recv(&mut self) -> Result<Option<Inbound>>;

    /// Write one structured message to the client.
    async fn send(&mut self, message: &OutboundMessage) -> Result<()>;

    /// Write a plain text payload (used for the liveness probe).
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// Release the connection resource. Called exactly once, on teardown.
    async fn close(&mut self) -> Result<()>;
}
