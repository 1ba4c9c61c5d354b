//! Judgment pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Retrieval (connector fan-out, relevance scoring, ranking, fallback)
//! - Per-item stance classification
//! - Conflict detection across analyses
//! - Verdict synthesis

pub mod analyze;
pub mod conflicts;
pub mod judge;
pub mod prompts;
pub mod relevance;
pub mod retrieval;
pub mod synthesize;
pub mod synthetic;

pub use analyze::{partition, AnalyzedEvidence, EvidenceAnalyzer};
pub use conflicts::{fingerprint, serialize_analyses, ConflictDetector};
pub use judge::ResearchJudge;
pub use prompts::{
    format_classify_prompt, format_conflicts_prompt, format_synthesize_prompt, prompts_hash,
};
pub use relevance::{candidate_to_evidence, extract_key_findings, score, score_with};
pub use retrieval::{rank, ConnectorOutcome, GatherReport, RetrievalDispatcher};
pub use synthesize::VerdictSynthesizer;
