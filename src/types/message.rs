//! Outbound wire messages.
//!
//! The transport emits structured JSON messages of a fixed shape:
//!
//! ```json
//! { "type": "message", "text": "..." }
//! { "type": "error", "error": { "type": "...", "message": "..." } }
//! ```
//!
//! The periodic liveness probe is a plain text `"ping"` payload and is not
//! part of this envelope.

use serde::{Deserialize, Serialize};

/// Typed error payload inside an outbound error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Wire-level error tag, e.g. `"conversion_error"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Human-readable description.
    pub message: String,
}

/// One structured message written back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Commentary text (fresh or suppressed/cached).
    Message { text: String },

    /// Typed error envelope.
    Error { error: ErrorEnvelope },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_shape() {
        let msg = OutboundMessage::Message { text: "hello".into() };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"type": "message", "text": "hello"}));
    }

    #[test]
    fn error_wire_shape() {
        let msg = OutboundMessage::Error {
            error: ErrorEnvelope {
                kind: "conversion_error".into(),
                message: "ffmpeg exited with status 1".into(),
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "error",
                "error": {
                    "type": "conversion_error",
                    "message": "ffmpeg exited with status 1"
                }
            })
        );
    }

    #[test]
    fn round_trips_through_serde() {
        let msg = OutboundMessage::Error {
            error: ErrorEnvelope { kind: "rate_limited".into(), message: "quota".into() },
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
