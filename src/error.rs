//! Error types for the commentary engine.
//!
//! Every failure a pipeline can hit is represented here and carries enough
//! context to build the typed error envelope sent back over the transport.
//! Pipeline failures never escape as unhandled faults: they are converted
//! into tagged [`AnalysisOutcome::Failure`](crate::AnalysisOutcome) values
//! at the pipeline boundary.
//!
//! ## Error Categories
//!
//! - **InvalidInput**: a frame that cannot be decoded into its medium
//! - **Conversion**: the external transcoding subprocess failed
//! - **Api**: transport/auth failure talking to an external model
//! - **RateLimited**: the external model reported quota exhaustion
//! - **Parse**: a model response violated the agreed schema
//! - **Transport**: the client connection failed mid-session
//! - **Unknown**: anything uncategorized
//!
//! ## Retry Classification
//!
//! ```rust
//! use colorcast::EngineError;
//!
//! let error = EngineError::rate_limited("quota exceeded");
//! assert!(error.is_retryable());
//! ```

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Main error type for engine operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    #[error("invalid input frame: {reason}")]
    InvalidInput { reason: String },

    #[error("transcoding failed: {detail}")]
    Conversion {
        detail: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("model API error: {reason}")]
    Api {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("model rate limit exceeded: {reason}")]
    RateLimited { reason: String },

    #[error("malformed model response in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("transport error: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("unexpected failure: {reason}")]
    Unknown {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Retryable errors leave the session loop running; the client simply
    /// resends a frame. Non-retryable errors indicate a contract violation
    /// that a resend cannot fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::InvalidInput { .. } => false,
            EngineError::Conversion { .. } => false,
            EngineError::Api { .. } => true,
            EngineError::RateLimited { .. } => true,
            EngineError::Parse { .. } => false,
            EngineError::Transport { .. } => true,
            EngineError::Unknown { .. } => false,
        }
    }

    /// The wire-level error tag used in outbound error envelopes.
    pub fn wire_kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput { .. } => "invalid_input",
            EngineError::Conversion { .. } => "conversion_error",
            EngineError::Api { .. } => "api_error",
            EngineError::RateLimited { .. } => "rate_limited",
            EngineError::Parse { .. } => "parse_error",
            EngineError::Transport { .. } | EngineError::Unknown { .. } => "unknown",
        }
    }

    /// Helper constructor for undecodable frames.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        EngineError::InvalidInput { reason: reason.into() }
    }

    /// Helper constructor for transcoding failures.
    pub fn conversion(detail: impl Into<String>) -> Self {
        EngineError::Conversion { detail: detail.into(), source: None }
    }

    /// Helper constructor for transcoding failures with a source.
    pub fn conversion_with_source(
        detail: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        EngineError::Conversion { detail: detail.into(), source: Some(source) }
    }

    /// Helper constructor for model API failures.
    pub fn api_error(reason: impl Into<String>) -> Self {
        EngineError::Api { reason: reason.into(), source: None }
    }

    /// Helper constructor for model API failures with a source.
    pub fn api_error_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        EngineError::Api { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for quota exhaustion.
    pub fn rate_limited(reason: impl Into<String>) -> Self {
        EngineError::RateLimited { reason: reason.into() }
    }

    /// Helper constructor for schema violations in model responses.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        EngineError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for transport failures.
    pub fn transport(reason: impl Into<String>) -> Self {
        EngineError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with a source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        EngineError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for uncategorized failures.
    pub fn unknown(reason: impl Into<String>) -> Self {
        EngineError::Unknown { reason: reason.into(), source: None }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Unknown { reason: "I/O failure".to_string(), source: Some(Box::new(err)) }
    }
}
