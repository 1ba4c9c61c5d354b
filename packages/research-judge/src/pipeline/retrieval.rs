//! Retrieval dispatcher - fan a query out to every source and rank.
//!
//! Gather runs in two phases:
//! 1. Fan-out: every applicable connector is called concurrently, each
//!    bounded by the query's evidence count and the connector timeout.
//! 2. Fan-in: once all calls have returned, candidates are scored,
//!    filtered by the confidence threshold, merged in connector order,
//!    stably sorted by relevance, deduplicated and truncated.
//!
//! Nothing is ranked until every call has finished, so the result does not
//! depend on completion order.

use futures::future::join_all;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ConnectorError, ConnectorResult, JudgeError, Result};
use crate::pipeline::{relevance, synthetic};
use crate::traits::connector::{RawCandidate, SourceConnector};
use crate::types::{config::JudgeConfig, evidence::Evidence, query::Query};

/// What happened to one connector during a gather.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorOutcome {
    pub connector: String,

    /// Candidates returned (after the per-connector bound)
    pub returned: usize,

    /// Candidates that passed the confidence threshold
    pub admitted: usize,

    /// Failure description, if the call failed
    pub error: Option<String>,
}

impl ConnectorOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a gather with per-connector bookkeeping.
#[derive(Debug, Clone)]
pub struct GatherReport {
    /// Ranked evidence, at most `evidence_count` items
    pub evidence: Vec<Evidence>,

    /// One entry per applicable connector, in registration order
    pub outcomes: Vec<ConnectorOutcome>,

    /// Whether the synthetic fallback produced the evidence
    pub used_fallback: bool,
}

/// Fans queries out to source connectors and ranks what comes back.
#[derive(Clone)]
pub struct RetrievalDispatcher {
    connectors: Vec<Arc<dyn SourceConnector>>,
    config: JudgeConfig,
}

impl RetrievalDispatcher {
    /// Create a dispatcher over the given connectors.
    ///
    /// Registration order is the tie-break order for equal scores.
    pub fn new(connectors: Vec<Arc<dyn SourceConnector>>, config: JudgeConfig) -> Self {
        Self { connectors, config }
    }

    /// Add a connector after the existing ones.
    pub fn with_connector(mut self, connector: Arc<dyn SourceConnector>) -> Self {
        self.connectors.push(connector);
        self
    }

    pub fn connectors(&self) -> &[Arc<dyn SourceConnector>] {
        &self.connectors
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Gather ranked evidence for a query.
    pub async fn gather(&self, query: &Query) -> Result<Vec<Evidence>> {
        self.gather_with_cancel(query, &CancellationToken::new())
            .await
            .map(|report| report.evidence)
    }

    /// Gather with cancellation support.
    ///
    /// Cancellation makes every in-flight connector call fail, which
    /// routes the gather to the synthetic fallback (or to
    /// `JudgeError::Cancelled` when the fallback is disabled).
    pub async fn gather_with_cancel(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<GatherReport> {
        let applicable: Vec<&Arc<dyn SourceConnector>> = self
            .connectors
            .iter()
            .filter(|c| c.applies_to(query.domain()))
            .collect();

        debug!(
            domain = query.domain(),
            connectors = applicable.len(),
            "Dispatching evidence search"
        );

        // Fan out; join_all keeps registration order regardless of completion order
        let calls = applicable
            .iter()
            .map(|connector| self.call_connector(connector.as_ref(), query, cancel));
        let results: Vec<ConnectorResult<Vec<RawCandidate>>> = join_all(calls).await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut admitted: Vec<Evidence> = Vec::new();
        let mut failures = 0usize;

        for (connector, result) in applicable.iter().zip(results) {
            let name = connector.name().to_string();
            match result {
                Ok(mut candidates) => {
                    candidates.truncate(query.evidence_count());
                    let returned = candidates.len();
                    let before = admitted.len();
                    admitted.extend(self.score_candidates(query, candidates, &name));

                    let count = admitted.len() - before;
                    debug!(connector = %name, returned, admitted = count, "Connector finished");
                    outcomes.push(ConnectorOutcome {
                        connector: name,
                        returned,
                        admitted: count,
                        error: None,
                    });
                }
                Err(e) => {
                    failures += 1;
                    warn!(connector = %name, error = %e, "Connector failed, treating as zero results");
                    outcomes.push(ConnectorOutcome {
                        connector: name,
                        returned: 0,
                        admitted: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        // A cancelled gather discards whatever finished before the signal
        if failures == applicable.len() || cancel.is_cancelled() {
            return self.fallback(query, outcomes, cancel);
        }

        let evidence = rank(admitted, query.evidence_count());
        info!(
            evidence = evidence.len(),
            failed_connectors = failures,
            "Evidence gathered"
        );

        Ok(GatherReport {
            evidence,
            outcomes,
            used_fallback: false,
        })
    }

    /// Call one connector with timeout and cancellation.
    async fn call_connector(
        &self,
        connector: &dyn SourceConnector,
        query: &Query,
        cancel: &CancellationToken,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        let timeout = self.config.connector_timeout();
        let search = connector.search(query.question(), query.domain(), query.evidence_count());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConnectorError::Cancelled),
            result = tokio::time::timeout(timeout, search) => match result {
                Ok(result) => result,
                Err(_) => Err(ConnectorError::Timeout {
                    connector: connector.name().to_string(),
                    after_ms: self.config.connector_timeout_ms,
                }),
            },
        }
    }

    /// Score candidates and keep those at or above the threshold.
    fn score_candidates(
        &self,
        query: &Query,
        candidates: Vec<RawCandidate>,
        connector: &str,
    ) -> Vec<Evidence> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = relevance::score_with(
                    &self.config.relevance,
                    query.question(),
                    &candidate.title,
                    &candidate.abstract_text,
                );
                (score >= query.confidence_threshold())
                    .then(|| relevance::candidate_to_evidence(candidate, score, connector))
            })
            .collect()
    }

    /// Every connector failed, none applied, or the gather was cancelled.
    ///
    /// Fails when the synthetic items are all below the threshold, since
    /// nothing would be left to judge.
    fn fallback(
        &self,
        query: &Query,
        outcomes: Vec<ConnectorOutcome>,
        cancel: &CancellationToken,
    ) -> Result<GatherReport> {
        let attempted = outcomes.len();

        if !self.config.synthetic_fallback {
            if cancel.is_cancelled() {
                return Err(JudgeError::Cancelled);
            }
            return Err(JudgeError::AllConnectorsFailed { attempted });
        }

        warn!(
            attempted,
            domain = query.domain(),
            "All connectors failed, using synthetic evidence"
        );

        let generated = synthetic::generate(query, &self.config.synthetic);
        let admitted: Vec<Evidence> = generated
            .into_iter()
            .filter(|e| e.relevance_score >= query.confidence_threshold())
            .collect();

        if admitted.is_empty() {
            warn!(
                threshold = query.confidence_threshold(),
                "No synthetic evidence passed the threshold"
            );
            if cancel.is_cancelled() {
                return Err(JudgeError::Cancelled);
            }
            return Err(JudgeError::AllConnectorsFailed { attempted });
        }

        Ok(GatherReport {
            evidence: rank(admitted, query.evidence_count()),
            outcomes,
            used_fallback: true,
        })
    }
}

/// Stable sort by relevance (descending), drop duplicates, truncate.
///
/// Duplicates keep their highest-ranked copy.
pub fn rank(mut evidence: Vec<Evidence>, limit: usize) -> Vec<Evidence> {
    evidence.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    let mut unique: IndexMap<String, Evidence> = IndexMap::with_capacity(evidence.len());
    for item in evidence {
        unique.entry(item.dedup_key()).or_insert(item);
    }

    unique.into_values().take(limit).collect()
}
