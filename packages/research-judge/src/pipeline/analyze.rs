//! Evidence analyzer - per-item stance classification.
//!
//! Every evidence item gets exactly one successful classifier call. Calls
//! run concurrently up to `classify_concurrency`, and results are kept in
//! input order. One item failing (after retries) fails the batch: no
//! partition is produced from partial coverage.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{CapabilityError, JudgeError, Result};
use crate::traits::ai::StanceClassifier;
use crate::types::{
    config::JudgeConfig,
    evidence::{Evidence, EvidenceAnalysis},
};

/// Ranked evidence with its positionally aligned analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedEvidence {
    pub evidence: Vec<Evidence>,
    pub analyses: Vec<EvidenceAnalysis>,
}

impl AnalyzedEvidence {
    /// Iterate (evidence, analysis) pairs in ranked order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Evidence, &EvidenceAnalysis)> {
        self.evidence.iter().zip(self.analyses.iter())
    }

    /// Split into (supporting, opposing), preserving ranked order.
    pub fn partition(&self) -> (Vec<Evidence>, Vec<Evidence>) {
        partition(&self.evidence, &self.analyses)
    }
}

/// Split evidence by the `supports_claim` of its aligned analysis.
pub fn partition(
    evidence: &[Evidence],
    analyses: &[EvidenceAnalysis],
) -> (Vec<Evidence>, Vec<Evidence>) {
    debug_assert_eq!(evidence.len(), analyses.len());

    let (supporting, opposing): (Vec<_>, Vec<_>) = evidence
        .iter()
        .zip(analyses)
        .partition(|(_, analysis)| analysis.supports_claim);

    (
        supporting.into_iter().map(|(e, _)| e.clone()).collect(),
        opposing.into_iter().map(|(e, _)| e.clone()).collect(),
    )
}

/// Drives the stance classifier over a batch of evidence.
#[derive(Clone)]
pub struct EvidenceAnalyzer {
    classifier: Arc<dyn StanceClassifier>,
    config: JudgeConfig,
}

impl EvidenceAnalyzer {
    pub fn new(classifier: Arc<dyn StanceClassifier>, config: JudgeConfig) -> Self {
        Self { classifier, config }
    }

    /// Classify every item; output is aligned 1:1 with `evidence`.
    pub async fn analyze_all(
        &self,
        question: &str,
        evidence: &[Evidence],
    ) -> Result<Vec<EvidenceAnalysis>> {
        self.analyze_all_with_cancel(question, evidence, &CancellationToken::new())
            .await
    }

    /// Classify every item with cancellation support.
    pub async fn analyze_all_with_cancel(
        &self,
        question: &str,
        evidence: &[Evidence],
        cancel: &CancellationToken,
    ) -> Result<Vec<EvidenceAnalysis>> {
        let concurrency = self.config.classify_concurrency.max(1);
        debug!(items = evidence.len(), concurrency, "Classifying evidence");

        // `buffered` yields in input order, so slot i always holds item i
        let analyses: Vec<EvidenceAnalysis> = stream::iter(evidence.iter().enumerate())
            .map(|(index, item)| self.classify_item(question, index, item, cancel))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let supporting = analyses.iter().filter(|a| a.supports_claim).count();
        info!(
            items = analyses.len(),
            supporting,
            opposing = analyses.len() - supporting,
            "Evidence classified"
        );

        Ok(analyses)
    }

    /// Classify and keep the evidence alongside its analyses.
    pub async fn analyze(
        &self,
        question: &str,
        evidence: Vec<Evidence>,
        cancel: &CancellationToken,
    ) -> Result<AnalyzedEvidence> {
        let analyses = self
            .analyze_all_with_cancel(question, &evidence, cancel)
            .await?;
        Ok(AnalyzedEvidence { evidence, analyses })
    }

    /// Classify one item, retrying transient failures.
    async fn classify_item(
        &self,
        question: &str,
        index: usize,
        item: &Evidence,
        cancel: &CancellationToken,
    ) -> Result<EvidenceAnalysis> {
        let attempts = self.config.classify_attempts.max(1);
        let timeout = self.config.capability_timeout();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
                result = tokio::time::timeout(timeout, self.classifier.classify(question, item)) => {
                    result.unwrap_or(Err(CapabilityError::Timeout {
                        after_ms: self.config.capability_timeout_ms,
                    }))
                }
            };

            match result {
                Ok(analysis) => return Ok(analysis.normalized()),
                Err(CapabilityError::Cancelled) => return Err(JudgeError::Cancelled),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        index,
                        attempt,
                        error = %e,
                        "Classification failed, retrying"
                    );
                    let backoff = self.config.retry_backoff() * attempt;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(e) => {
                    return Err(JudgeError::Classification {
                        index,
                        title: item.source.title.clone(),
                        source: e,
                    })
                }
            }
        }
    }
}
