//! Configuration types for the judgment pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ResearchJudge`](crate::ResearchJudge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Per-call timeout for each source connector.
    ///
    /// A timed-out connector counts as failed. Default: 15000.
    pub connector_timeout_ms: u64,

    /// Per-call timeout for classifier, conflict and synthesis calls.
    ///
    /// Default: 60000.
    pub capability_timeout_ms: u64,

    /// Maximum concurrent stance classification calls.
    ///
    /// Default: 5.
    pub classify_concurrency: usize,

    /// Attempts per evidence item before classification fails the batch.
    ///
    /// Only retryable errors are retried. Default: 2.
    pub classify_attempts: u32,

    /// Delay before a retry, multiplied by the attempt number.
    ///
    /// Default: 500.
    pub retry_backoff_ms: u64,

    /// Generate synthetic evidence when every connector fails.
    ///
    /// Synthetic items are tagged `EvidenceOrigin::Synthetic`. Turn this
    /// off in production so placeholder data never reaches a verdict.
    /// Default: true.
    pub synthetic_fallback: bool,

    /// Reuse conflict lists for identical serialized analyses.
    ///
    /// Default: true.
    pub cache_conflicts: bool,

    /// Most conflict lists kept before the oldest is evicted.
    ///
    /// Default: 256.
    #[serde(default = "default_conflict_cache_capacity")]
    pub conflict_cache_capacity: usize,

    /// Relevance scoring weights.
    #[serde(default)]
    pub relevance: RelevanceWeights,

    /// Synthetic fallback tuning.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

fn default_conflict_cache_capacity() -> usize {
    256
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            connector_timeout_ms: 15_000,
            capability_timeout_ms: 60_000,
            classify_concurrency: 5,
            classify_attempts: 2,
            retry_backoff_ms: 500,
            synthetic_fallback: true,
            cache_conflicts: true,
            conflict_cache_capacity: default_conflict_cache_capacity(),
            relevance: RelevanceWeights::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl JudgeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the synthetic fallback disabled.
    pub fn production() -> Self {
        Self {
            synthetic_fallback: false,
            ..Self::default()
        }
    }

    /// Set the connector timeout.
    pub fn with_connector_timeout(mut self, timeout: Duration) -> Self {
        self.connector_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the capability timeout.
    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.capability_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set classification concurrency (at least 1).
    pub fn with_classify_concurrency(mut self, concurrency: usize) -> Self {
        self.classify_concurrency = concurrency.max(1);
        self
    }

    /// Set classification attempts (at least 1).
    pub fn with_classify_attempts(mut self, attempts: u32) -> Self {
        self.classify_attempts = attempts.max(1);
        self
    }

    /// Set retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Enable or disable the synthetic fallback.
    pub fn with_synthetic_fallback(mut self, enabled: bool) -> Self {
        self.synthetic_fallback = enabled;
        self
    }

    /// Enable or disable the conflict cache.
    pub fn with_conflict_cache(mut self, enabled: bool) -> Self {
        self.cache_conflicts = enabled;
        self
    }

    /// Set the conflict cache capacity (at least 1).
    pub fn with_conflict_cache_capacity(mut self, capacity: usize) -> Self {
        self.conflict_cache_capacity = capacity.max(1);
        self
    }

    /// Replace relevance weights.
    pub fn with_relevance(mut self, relevance: RelevanceWeights) -> Self {
        self.relevance = relevance;
        self
    }

    /// Replace synthetic fallback tuning.
    pub fn with_synthetic(mut self, synthetic: SyntheticConfig) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn connector_timeout(&self) -> Duration {
        Duration::from_millis(self.connector_timeout_ms)
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Weights for keyword relevance scoring.
///
/// `score = min((title_matches * title_weight + abstract_matches * abstract_weight)
/// / keyword_count * boost, 1.0)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    /// Weight of a keyword found in the title. Default: 0.6.
    pub title_weight: f64,

    /// Weight of a keyword found in the abstract. Default: 0.4.
    pub abstract_weight: f64,

    /// Multiplier applied before capping at 1.0. Default: 2.0.
    pub boost: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            title_weight: 0.6,
            abstract_weight: 0.4,
            boost: 2.0,
        }
    }
}

/// Tuning for the synthetic evidence generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Relevance of the first item. Default: 0.95.
    pub start_score: f64,

    /// Relevance decrease per item. Default: 0.07.
    pub score_step: f64,

    /// Every item whose index is a multiple of this opposes. Default: 3.
    pub oppose_every: usize,

    /// Label used in publication names and URLs. Default: "general".
    pub source_label: String,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start_score: 0.95,
            score_step: 0.07,
            oppose_every: 3,
            source_label: "general".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JudgeConfig::default();
        assert!(config.synthetic_fallback);
        assert_eq!(config.classify_concurrency, 5);
        assert_eq!(config.connector_timeout(), Duration::from_secs(15));
        assert_eq!(config.relevance.boost, 2.0);
        assert_eq!(config.synthetic.oppose_every, 3);
    }

    #[test]
    fn test_production_disables_fallback() {
        assert!(!JudgeConfig::production().synthetic_fallback);
    }

    #[test]
    fn test_builder_floors() {
        let config = JudgeConfig::new()
            .with_classify_concurrency(0)
            .with_classify_attempts(0)
            .with_conflict_cache_capacity(0)
            .with_connector_timeout(Duration::from_millis(250));
        assert_eq!(config.classify_concurrency, 1);
        assert_eq!(config.classify_attempts, 1);
        assert_eq!(config.conflict_cache_capacity, 1);
        assert_eq!(config.connector_timeout_ms, 250);
    }

    #[test]
    fn test_partial_json_uses_nested_defaults() {
        let json = r#"{
            "connector_timeout_ms": 1000,
            "capability_timeout_ms": 2000,
            "classify_concurrency": 3,
            "classify_attempts": 1,
            "retry_backoff_ms": 0,
            "synthetic_fallback": false,
            "cache_conflicts": false
        }"#;
        let config: JudgeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.classify_concurrency, 3);
        assert_eq!(config.relevance, RelevanceWeights::default());
        assert_eq!(config.synthetic.source_label, "general");
    }
}
