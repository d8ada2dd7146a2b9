//! Core data types flowing through the engine.

mod frame;
mod message;
mod outcome;

pub use frame::Frame;
pub use message::{ErrorEnvelope, OutboundMessage};
pub use outcome::{AnalysisOutcome, FailureKind, SUPPRESSED_PLACEHOLDER};
