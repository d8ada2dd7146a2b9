//! Pipeline analysis outcomes.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::message::{ErrorEnvelope, OutboundMessage};

/// Placeholder text echoed when a frame is suppressed before any real
/// outcome exists, and when best-effort commentary generation fails.
pub const SUPPRESSED_PLACEHOLDER: &str = "…";

/// Categorized failure tag carried on [`AnalysisOutcome::Failure`].
///
/// Mirrors the [`EngineError`] taxonomy but owns no payload; the human
/// readable message travels next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    ConversionError,
    ApiError,
    RateLimited,
    ParseError,
    Unknown,
}

impl FailureKind {
    /// Wire-level tag used in the outbound error envelope.
    pub fn as_wire_str(self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::ConversionError => "conversion_error",
            FailureKind::ApiError => "api_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ParseError => "parse_error",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl From<&EngineError> for FailureKind {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::InvalidInput { .. } => FailureKind::InvalidInput,
            EngineError::Conversion { .. } => FailureKind::ConversionError,
            EngineError::Api { .. } => FailureKind::ApiError,
            EngineError::RateLimited { .. } => FailureKind::RateLimited,
            EngineError::Parse { .. } => FailureKind::ParseError,
            _ => FailureKind::Unknown,
        }
    }
}

/// Result of processing one frame through a pipeline.
///
/// `Suppressed` is a first-class result, not an error: it means the last
/// computed outcome is still fresh and no new work was needed. The client
/// always receives exactly one message per processed frame, built from one
/// of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// A freshly computed commentary string.
    Success { text: String },

    /// Debounced: echoes the last good text, or the sentinel placeholder
    /// when nothing has been computed yet.
    Suppressed { text: String },

    /// A categorized pipeline failure.
    Failure { kind: FailureKind, message: String },
}

impl AnalysisOutcome {
    /// Build a `Failure` outcome from a pipeline error.
    pub fn failure(err: &EngineError) -> Self {
        AnalysisOutcome::Failure { kind: FailureKind::from(err), message: err.to_string() }
    }

    /// The commentary text, if this outcome carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success { text } | AnalysisOutcome::Suppressed { text } => Some(text),
            AnalysisOutcome::Failure { .. } => None,
        }
    }

    /// Whether this outcome represents a debounced cache hit.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, AnalysisOutcome::Suppressed { .. })
    }

    /// Serialize into the outbound wire message for this outcome.
    pub fn to_message(&self) -> OutboundMessage {
        match self {
            AnalysisOutcome::Success { text } | AnalysisOutcome::Suppressed { text } => {
                OutboundMessage::Message { text: text.clone() }
            }
            AnalysisOutcome::Failure { kind, message } => OutboundMessage::Error {
                error: ErrorEnvelope {
                    kind: kind.as_wire_str().to_string(),
                    message: message.clone(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_from_error_maps_kind_and_message() {
        let err = EngineError::conversion("ffmpeg exited with status 1");
        let outcome = AnalysisOutcome::failure(&err);
        match outcome {
            AnalysisOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::ConversionError);
                assert!(message.contains("ffmpeg exited"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn text_accessor_covers_success_and_suppressed() {
        let success = AnalysisOutcome::Success { text: "nice play".into() };
        assert_eq!(success.text(), Some("nice play"));

        let suppressed = AnalysisOutcome::Suppressed { text: "nice play".into() };
        assert_eq!(suppressed.text(), Some("nice play"));
        assert!(suppressed.is_suppressed());

        let failure = AnalysisOutcome::failure(&EngineError::unknown("boom"));
        assert_eq!(failure.text(), None);
    }

    #[test]
    fn wire_strings_match_error_taxonomy() {
        assert_eq!(FailureKind::InvalidInput.as_wire_str(), "invalid_input");
        assert_eq!(FailureKind::ConversionError.as_wire_str(), "conversion_error");
        assert_eq!(FailureKind::ApiError.as_wire_str(), "api_error");
        assert_eq!(FailureKind::RateLimited.as_wire_str(), "rate_limited");
        assert_eq!(FailureKind::ParseError.as_wire_str(), "parse_error");
        assert_eq!(FailureKind::Unknown.as_wire_str(), "unknown");
    }
}
