//! The research question handed to the pipeline.

use serde::Serialize;
use tracing::warn;

use crate::error::{JudgeError, Result};

/// Default minimum relevance an evidence item needs to be admitted.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Default number of evidence items to gather.
pub const DEFAULT_EVIDENCE_COUNT: usize = 5;

/// Largest evidence count a caller may ask for.
pub const MAX_EVIDENCE_COUNT: usize = 20;

/// Default research domain.
pub const DEFAULT_DOMAIN: &str = "general";

/// A research question to be judged.
///
/// Fields are private so a constructed query always holds a non-blank
/// question, a threshold in `[0, 1]` and an evidence count in `[1, 20]`.
/// The `with_*` setters replace out-of-range input with the defaults.
///
/// # Example
///
/// ```rust,ignore
/// let query = Query::new("Does coffee consumption reduce the risk of Parkinson's disease?")?
///     .with_domain("medical")
///     .with_confidence_threshold(0.5)
///     .with_evidence_count(3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    question: String,
    domain: String,
    confidence_threshold: f64,
    evidence_count: usize,
}

impl Query {
    /// Create a query with default domain, threshold and count.
    pub fn new(question: impl Into<String>) -> Result<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(JudgeError::InvalidQuery {
                reason: "question is empty".to_string(),
            });
        }

        Ok(Self {
            question,
            domain: DEFAULT_DOMAIN.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            evidence_count: DEFAULT_EVIDENCE_COUNT,
        })
    }

    /// Set the research domain. Blank domains become "general".
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into().trim().to_lowercase();
        self.domain = if domain.is_empty() {
            DEFAULT_DOMAIN.to_string()
        } else {
            domain
        };
        self
    }

    /// Set the relevance threshold, falling back to 0.7 outside `[0, 1]`.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = if (0.0..=1.0).contains(&threshold) {
            threshold
        } else {
            warn!(
                threshold,
                default = DEFAULT_CONFIDENCE_THRESHOLD,
                "Invalid confidence threshold, using default"
            );
            DEFAULT_CONFIDENCE_THRESHOLD
        };
        self
    }

    /// Set the evidence count, falling back to 5 outside `[1, 20]`.
    pub fn with_evidence_count(mut self, count: usize) -> Self {
        self.evidence_count = if (1..=MAX_EVIDENCE_COUNT).contains(&count) {
            count
        } else {
            warn!(
                count,
                default = DEFAULT_EVIDENCE_COUNT,
                "Invalid evidence count, using default"
            );
            DEFAULT_EVIDENCE_COUNT
        };
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence_count
    }

    /// Lower-cased whitespace-separated words of the question.
    pub fn topic_words(&self) -> Vec<String> {
        self.question
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
