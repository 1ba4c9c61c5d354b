//! The research judge - main entry point of the pipeline.
//!
//! Runs the four stages in order, each fully consuming the previous
//! stage's output:
//!
//! 1. Gather ranked evidence from the source connectors
//! 2. Classify every item's stance and partition
//! 3. Look for conflicts across the analyses
//! 4. Synthesize the verdict
//!
//! Any fatal error aborts the current query only; the judge holds no
//! per-query state and is ready for the next call.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::error::Result;
use crate::pipeline::{
    analyze::EvidenceAnalyzer, conflicts::ConflictDetector, retrieval::RetrievalDispatcher,
    synthesize::VerdictSynthesizer,
};
use crate::traits::{
    ai::{ConflictIdentifier, JudgmentSynthesizer, StanceClassifier},
    connector::SourceConnector,
};
use crate::types::{
    config::JudgeConfig,
    evidence::{Judgment, SynthesisContext},
    query::Query,
    run::{PipelineRun, PipelineState},
};

/// Evidence aggregation and judgment pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let judge = ResearchJudge::with_capabilities(
///     connectors::default_connectors(&credentials),
///     Arc::new(OpenAI::new(credentials.openai_api_key())),
///     JudgeConfig::default(),
/// );
///
/// let query = Query::new("Does coffee reduce the risk of Parkinson's disease?")?
///     .with_domain("medical")
///     .with_evidence_count(3);
///
/// let judgment = judge.judge(&query).await?;
/// println!("{} ({:.0}%)", judgment.verdict, judgment.confidence * 100.0);
/// ```
#[derive(Clone)]
pub struct ResearchJudge {
    dispatcher: RetrievalDispatcher,
    analyzer: EvidenceAnalyzer,
    conflicts: ConflictDetector,
    synthesizer: VerdictSynthesizer,
}

impl ResearchJudge {
    /// Create a judge from one implementation per capability.
    pub fn new(
        connectors: Vec<Arc<dyn SourceConnector>>,
        classifier: Arc<dyn StanceClassifier>,
        identifier: Arc<dyn ConflictIdentifier>,
        synthesizer: Arc<dyn JudgmentSynthesizer>,
        config: JudgeConfig,
    ) -> Self {
        Self {
            dispatcher: RetrievalDispatcher::new(connectors, config.clone()),
            analyzer: EvidenceAnalyzer::new(classifier, config.clone()),
            conflicts: ConflictDetector::new(identifier, config.clone()),
            synthesizer: VerdictSynthesizer::new(synthesizer, config),
        }
    }

    /// Create a judge from a single backend that provides all three capabilities.
    pub fn with_capabilities<C>(
        connectors: Vec<Arc<dyn SourceConnector>>,
        capabilities: Arc<C>,
        config: JudgeConfig,
    ) -> Self
    where
        C: StanceClassifier + ConflictIdentifier + JudgmentSynthesizer + 'static,
    {
        Self::new(
            connectors,
            capabilities.clone(),
            capabilities.clone(),
            capabilities,
            config,
        )
    }

    /// Assemble a judge from prebuilt stages.
    pub fn from_stages(
        dispatcher: RetrievalDispatcher,
        analyzer: EvidenceAnalyzer,
        conflicts: ConflictDetector,
        synthesizer: VerdictSynthesizer,
    ) -> Self {
        Self {
            dispatcher,
            analyzer,
            conflicts,
            synthesizer,
        }
    }

    pub fn dispatcher(&self) -> &RetrievalDispatcher {
        &self.dispatcher
    }

    /// Judge a query.
    pub async fn judge(&self, query: &Query) -> Result<Judgment> {
        self.judge_with_cancel(query, &CancellationToken::new()).await
    }

    /// Judge with cancellation support.
    pub async fn judge_with_cancel(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<Judgment> {
        self.run(query, cancel).await.1
    }

    /// Judge and return the run record alongside the outcome.
    pub async fn run(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> (PipelineRun, Result<Judgment>) {
        let mut run = PipelineRun::new();
        let span = info_span!("judge", run_id = %run.id, domain = query.domain());

        let result = self.drive(query, &mut run, cancel).instrument(span).await;
        if let Err(e) = &result {
            warn!(run_id = %run.id, error = %e, "Judgment failed");
            run.fail(e.to_string());
        }

        (run, result)
    }

    /// Retry synthesis with context recovered from `JudgeError::Synthesis`.
    ///
    /// Skips gathering, classification and conflict checking.
    pub async fn resynthesize(&self, query: &Query, context: SynthesisContext) -> Result<Judgment> {
        self.synthesizer
            .synthesize(query, context, &CancellationToken::new())
            .instrument(info_span!("resynthesize", domain = query.domain()))
            .await
    }

    async fn drive(
        &self,
        query: &Query,
        run: &mut PipelineRun,
        cancel: &CancellationToken,
    ) -> Result<Judgment> {
        info!(question = query.question(), "Judging");

        run.advance(PipelineState::Gathering)?;
        let report = self.dispatcher.gather_with_cancel(query, cancel).await?;
        if report.used_fallback {
            warn!("Verdict will rest on synthetic evidence");
        }

        run.advance(PipelineState::Analyzing)?;
        let analyzed = self
            .analyzer
            .analyze(query.question(), report.evidence, cancel)
            .await?;

        run.advance(PipelineState::ConflictChecking)?;
        let conflicts = self
            .conflicts
            .find_conflicts_with_cancel(query.question(), &analyzed.analyses, cancel)
            .await?;

        run.advance(PipelineState::Synthesizing)?;
        let (supporting, opposing) = analyzed.partition();
        let judgment = self
            .synthesizer
            .synthesize(
                query,
                SynthesisContext {
                    supporting,
                    opposing,
                    conflicts,
                },
                cancel,
            )
            .await?;

        run.advance(PipelineState::Done)?;
        Ok(judgment)
    }
}
