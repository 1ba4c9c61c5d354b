//! Capability traits for the opaque judgment calls.
//!
//! The pipeline needs three LLM-style capabilities:
//! - Stance classification of a single evidence item
//! - Conflict identification across serialized analyses
//! - Synthesis of the final verdict
//!
//! Implementations wrap a specific provider (see `ai::OpenAI`). The core
//! only decides how they are invoked, retried and consumed.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityResult;
use crate::types::evidence::{Evidence, EvidenceAnalysis};

/// Classifies whether one evidence item supports the claim.
#[async_trait]
pub trait StanceClassifier: Send + Sync {
    /// Classify `evidence` against `question`.
    ///
    /// Implementations read the title, content and key findings.
    async fn classify(&self, question: &str, evidence: &Evidence)
        -> CapabilityResult<EvidenceAnalysis>;
}

/// Finds contradictions between evidence analyses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConflictIdentifier: Send + Sync {
    /// Return one natural-language description per conflict found.
    async fn find_conflicts(
        &self,
        question: &str,
        serialized_analyses: &str,
    ) -> CapabilityResult<Vec<String>>;
}

/// Produces the final verdict from the partitioned evidence.
#[async_trait]
pub trait JudgmentSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesisOutput>;
}

/// Input handed to a [`JudgmentSynthesizer`].
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub question: &'a str,
    pub domain: &'a str,
    pub supporting: &'a [Evidence],
    pub opposing: &'a [Evidence],
    pub conflicts: &'a [String],
}

/// Structured verdict returned by a synthesizer.
///
/// The core wraps this into a `Judgment` together with the evidence it
/// already holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SynthesisOutput {
    /// Verdict text, e.g. "supported", "refuted" or "inconclusive"
    pub verdict: String,

    /// Confidence in the verdict (0.0 to 1.0)
    pub confidence: f64,

    /// Reasoning citing specific evidence
    pub reasoning: String,

    /// Limitations of the evidence base
    #[serde(default)]
    pub limitations: Vec<String>,

    /// Optional recommendation for the reader
    #[serde(default)]
    pub recommendation: Option<String>,
}
