//! Evidence Aggregation & Judgment Pipeline
//!
//! Answers a factual research question by collecting evidence from several
//! sources, judging each item's stance, looking for contradictions across
//! items and synthesizing a single confidence-weighted verdict.
//!
//! # Design Philosophy
//!
//! **"The core orchestrates, capabilities judge"**
//!
//! - Retrieval, ranking and partitioning are deterministic and local
//! - Stance, conflicts and the verdict come from external capabilities
//! - Connector failures degrade the result; they never abort it
//! - Capability failures abort the current query only
//!
//! # Usage
//!
//! ```rust,ignore
//! use research_judge::{Query, ResearchJudge, JudgeConfig};
//! use research_judge::testing::{MockClassifier, MockConflictFinder, MockConnector, MockSynthesizer};
//!
//! let judge = ResearchJudge::new(
//!     vec![Arc::new(MockConnector::new("academic"))],
//!     Arc::new(MockClassifier::new()),
//!     Arc::new(MockConflictFinder::new()),
//!     Arc::new(MockSynthesizer::new()),
//!     JudgeConfig::default(),
//! );
//!
//! let query = Query::new("Does coffee reduce the risk of Parkinson's disease?")?
//!     .with_domain("medical")
//!     .with_confidence_threshold(0.5);
//! let judgment = judge.judge(&query).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Source connector and capability abstractions
//! - [`types`] - Query, evidence, judgment, configuration and run record
//! - [`pipeline`] - Dispatcher, analyzer, conflict detector, synthesizer
//! - [`connectors`] - Semantic Scholar, arXiv and PubMed connectors
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod connectors;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{CapabilityError, ConnectorError, JudgeError};
pub use pipeline::{
    AnalyzedEvidence, ConflictDetector, EvidenceAnalyzer, GatherReport, ResearchJudge,
    RetrievalDispatcher, VerdictSynthesizer,
};
pub use security::Credentials;
pub use traits::{
    ai::{ConflictIdentifier, JudgmentSynthesizer, StanceClassifier, SynthesisOutput, SynthesisRequest},
    connector::{RawCandidate, SourceConnector},
};
pub use types::{
    config::{JudgeConfig, RelevanceWeights, SyntheticConfig},
    evidence::{
        Evidence, EvidenceAnalysis, EvidenceOrigin, Judgment, SourceMetadata, SynthesisContext,
    },
    query::Query,
    run::{PipelineRun, PipelineState, StateTransition, TransitionError},
};
