//! Typed errors for the research judge.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! distinguish recoverable degradation from fatal stage failures.

use thiserror::Error;

use crate::types::{evidence::SynthesisContext, run::TransitionError};

/// Errors that abort a single judgment run.
///
/// Connector failures never appear here; the dispatcher absorbs them.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Invalid query provided
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Every connector failed and the synthetic fallback is disabled
    #[error("all {attempted} source connectors failed and synthetic fallback is disabled")]
    AllConnectorsFailed { attempted: usize },

    /// Stance classification failed for one evidence item
    #[error("classification failed for evidence #{index} ({title}): {source}")]
    Classification {
        index: usize,
        title: String,
        #[source]
        source: CapabilityError,
    },

    /// Conflict identification failed
    #[error("conflict check failed: {0}")]
    ConflictCheck(#[source] CapabilityError),

    /// Judgment synthesis failed; the gathered context is kept for a retry
    #[error("synthesis failed: {source}")]
    Synthesis {
        #[source]
        source: CapabilityError,
        context: Box<SynthesisContext>,
    },

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// The pipeline tried to move to a stage out of order
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl JudgeError {
    /// Take the preserved synthesis context out of a synthesis failure.
    pub fn into_synthesis_context(self) -> Option<SynthesisContext> {
        match self {
            JudgeError::Synthesis { context, .. } => Some(*context),
            _ => None,
        }
    }
}

/// Errors from a single source connector.
///
/// These are caught by the dispatcher, logged, and counted as zero results.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success response
    #[error("{connector} returned status {status}")]
    Status { connector: String, status: u16 },

    /// Connector exceeded its per-call timeout
    #[error("{connector} timed out after {after_ms}ms")]
    Timeout { connector: String, after_ms: u64 },

    /// Response body could not be understood
    #[error("{connector} response parse error: {reason}")]
    Parse { connector: String, reason: String },

    /// Caller cancelled the gather
    #[error("connector call cancelled")]
    Cancelled,
}

/// Errors from an external judgment capability (classifier, conflict
/// identifier, synthesizer).
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The inference credential was never configured
    #[error("missing credential: {var} is not set")]
    MissingCredential { var: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The backend answered with an error
    #[error("API error: {0}")]
    Api(String),

    /// The backend answered with something we could not parse
    #[error("response parse error: {0}")]
    Parse(String),

    /// The call exceeded its timeout
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Caller cancelled the call
    #[error("capability call cancelled")]
    Cancelled,
}

impl CapabilityError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CapabilityError::Http(_) | CapabilityError::Api(_) | CapabilityError::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for CapabilityError {
    fn from(e: serde_json::Error) -> Self {
        CapabilityError::Parse(e.to_string())
    }
}

/// Result type alias for judgment operations.
pub type Result<T> = std::result::Result<T, JudgeError>;

/// Result type alias for connector operations.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Result type alias for capability calls.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(CapabilityError::Timeout { after_ms: 10 }.is_retryable());
        assert!(CapabilityError::Api("overloaded".into()).is_retryable());
        assert!(!CapabilityError::Cancelled.is_retryable());
        assert!(!CapabilityError::MissingCredential {
            var: "OPENAI_API_KEY".into()
        }
        .is_retryable());
        assert!(!CapabilityError::Parse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_classification_error_names_item() {
        let err = JudgeError::Classification {
            index: 2,
            title: "Coffee and Parkinson's".into(),
            source: CapabilityError::Timeout { after_ms: 500 },
        };
        let msg = err.to_string();
        assert!(msg.contains("#2"));
        assert!(msg.contains("Coffee and Parkinson's"));
    }

    #[test]
    fn test_synthesis_context_recoverable() {
        let context = SynthesisContext {
            supporting: vec![],
            opposing: vec![],
            conflicts: vec!["A and B disagree on effect size".into()],
        };
        let err = JudgeError::Synthesis {
            source: CapabilityError::Api("boom".into()),
            context: Box::new(context),
        };
        let recovered = err.into_synthesis_context().unwrap();
        assert_eq!(recovered.conflicts.len(), 1);

        assert!(JudgeError::Cancelled.into_synthesis_context().is_none());
    }
}
