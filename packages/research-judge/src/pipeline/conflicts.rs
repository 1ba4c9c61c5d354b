//! Conflict detector - surfaces contradictions across analyses.
//!
//! The serialized form handed to the conflict identifier is a fixed
//! contract: identical analyses in identical order always serialize to
//! identical bytes, which is what makes the conflict cache sound.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{CapabilityError, JudgeError, Result};
use crate::pipeline::prompts::prompts_hash;
use crate::traits::ai::ConflictIdentifier;
use crate::types::{config::JudgeConfig, evidence::EvidenceAnalysis};

/// Serialize analyses for the conflict identifier.
///
/// Each analysis becomes a numbered block; blocks are separated by a blank
/// line:
///
/// ```text
/// Analysis 1:
/// - Supports claim: true
/// - Confidence: 0.8
/// - Key points: first, second
/// - Limitations: small sample
/// ```
pub fn serialize_analyses(analyses: &[EvidenceAnalysis]) -> String {
    let mut out = String::new();
    for (i, analysis) in analyses.iter().enumerate() {
        out.push_str(&format!("Analysis {}:\n", i + 1));
        out.push_str(&format!("- Supports claim: {}\n", analysis.supports_claim));
        out.push_str(&format!("- Confidence: {}\n", analysis.confidence));
        out.push_str(&format!("- Key points: {}\n", analysis.key_points.join(", ")));
        out.push_str(&format!(
            "- Limitations: {}\n\n",
            analysis.limitations.join(", ")
        ));
    }
    out
}

/// Stable fingerprint of a conflict check input.
///
/// Includes the prompt templates, so editing a prompt invalidates cached
/// conflict lists.
pub fn fingerprint(question: &str, serialized: &str) -> String {
    fingerprint_with(&prompts_hash(), question, serialized)
}

fn fingerprint_with(prompt_version: &str, question: &str, serialized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt_version.as_bytes());
    hasher.update([0u8]);
    hasher.update(question.as_bytes());
    hasher.update([0u8]);
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Runs the conflict identifier over a batch of analyses.
///
/// Results are cached by fingerprint. The cache holds at most
/// `conflict_cache_capacity` entries and evicts the oldest first.
#[derive(Clone)]
pub struct ConflictDetector {
    identifier: Arc<dyn ConflictIdentifier>,
    config: JudgeConfig,
    cache: Arc<RwLock<IndexMap<String, Vec<String>>>>,
}

impl ConflictDetector {
    pub fn new(identifier: Arc<dyn ConflictIdentifier>, config: JudgeConfig) -> Self {
        Self {
            identifier,
            config,
            cache: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Find conflicts between analyses.
    pub async fn find_conflicts(
        &self,
        question: &str,
        analyses: &[EvidenceAnalysis],
    ) -> Result<Vec<String>> {
        self.find_conflicts_with_cancel(question, analyses, &CancellationToken::new())
            .await
    }

    /// Find conflicts with cancellation support.
    ///
    /// An empty batch has nothing to contradict and skips the call.
    pub async fn find_conflicts_with_cancel(
        &self,
        question: &str,
        analyses: &[EvidenceAnalysis],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if analyses.is_empty() {
            debug!("No analyses, skipping conflict check");
            return Ok(Vec::new());
        }

        let serialized = serialize_analyses(analyses);
        let key = fingerprint(question, &serialized);

        if self.config.cache_conflicts {
            if let Some(hit) = self.cached(&key) {
                debug!(fingerprint = %key, "Conflict cache hit");
                return Ok(hit);
            }
        }

        let timeout = self.config.capability_timeout();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
            result = tokio::time::timeout(timeout, self.identifier.find_conflicts(question, &serialized)) => {
                result.unwrap_or(Err(CapabilityError::Timeout {
                    after_ms: self.config.capability_timeout_ms,
                }))
            }
        };

        let conflicts: Vec<String> = result
            .map_err(JudgeError::ConflictCheck)?
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        info!(conflicts = conflicts.len(), "Conflict check complete");

        if self.config.cache_conflicts {
            self.remember(key, conflicts.clone());
        }

        Ok(conflicts)
    }

    /// Number of cached conflict results.
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn cached(&self, key: &str) -> Option<Vec<String>> {
        self.cache.read().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, conflicts: Vec<String>) {
        let Ok(mut cache) = self.cache.write() else {
            return;
        };

        let capacity = self.config.conflict_cache_capacity.max(1);
        while cache.len() >= capacity && !cache.contains_key(&key) {
            if let Some((evicted, _)) = cache.shift_remove_index(0) {
                debug!(fingerprint = %evicted, "Evicted cached conflicts");
            }
        }
        cache.insert(key, conflicts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ai::MockConflictIdentifier;
    use mockall::predicate::eq;

    fn analysis(supports: bool, confidence: f64, points: &[&str], limits: &[&str]) -> EvidenceAnalysis {
        EvidenceAnalysis {
            supports_claim: supports,
            confidence,
            key_points: points.iter().map(|s| s.to_string()).collect(),
            limitations: limits.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_serialization_format() {
        let analyses = vec![
            analysis(true, 0.8, &["lower risk", "dose dependent"], &["observational"]),
            analysis(false, 0.55, &[], &["small sample", "short follow-up"]),
        ];

        let expected = "Analysis 1:\n\
            - Supports claim: true\n\
            - Confidence: 0.8\n\
            - Key points: lower risk, dose dependent\n\
            - Limitations: observational\n\n\
            Analysis 2:\n\
            - Supports claim: false\n\
            - Confidence: 0.55\n\
            - Key points: \n\
            - Limitations: small sample, short follow-up\n\n";

        assert_eq!(serialize_analyses(&analyses), expected);
    }

    #[test]
    fn test_serialization_deterministic() {
        let analyses = vec![
            analysis(true, 0.1 + 0.2, &["a"], &["b"]),
            analysis(false, 1.0, &["c"], &[]),
        ];
        let copy = analyses.clone();
        assert_eq!(
            serialize_analyses(&analyses).as_bytes(),
            serialize_analyses(&copy).as_bytes()
        );
        assert_eq!(
            fingerprint("q", &serialize_analyses(&analyses)),
            fingerprint("q", &serialize_analyses(&copy))
        );
    }

    #[test]
    fn test_fingerprint_tracks_prompt_version() {
        let serialized = serialize_analyses(&[analysis(true, 0.8, &["x"], &[])]);
        assert_eq!(
            fingerprint("q", &serialized),
            fingerprint_with(&prompts_hash(), "q", &serialized)
        );
        assert_ne!(
            fingerprint_with("v1", "q", &serialized),
            fingerprint_with("v2", "q", &serialized)
        );
    }

    #[test]
    fn test_order_matters() {
        let a = analysis(true, 0.9, &["a"], &[]);
        let b = analysis(false, 0.4, &["b"], &[]);
        assert_ne!(
            serialize_analyses(&[a.clone(), b.clone()]),
            serialize_analyses(&[b, a])
        );
    }

    #[tokio::test]
    async fn test_passes_question_and_serialized_block() {
        let analyses = vec![analysis(true, 0.8, &["x"], &[])];
        let serialized = serialize_analyses(&analyses);

        let mut identifier = MockConflictIdentifier::new();
        identifier
            .expect_find_conflicts()
            .with(eq("Is X true?"), eq(serialized))
            .times(1)
            .returning(|_, _| Ok(vec!["Study 1 contradicts study 2".to_string(), "  ".to_string()]));

        let detector = ConflictDetector::new(Arc::new(identifier), JudgeConfig::default());
        let conflicts = detector.find_conflicts("Is X true?", &analyses).await.unwrap();
        assert_eq!(conflicts, vec!["Study 1 contradicts study 2"]);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_call() {
        let mut identifier = MockConflictIdentifier::new();
        identifier
            .expect_find_conflicts()
            .times(1)
            .returning(|_, _| Ok(vec!["conflict".to_string()]));

        let detector = ConflictDetector::new(Arc::new(identifier), JudgeConfig::default());
        let analyses = vec![analysis(true, 0.8, &["x"], &[])];

        let first = detector.find_conflicts("q", &analyses).await.unwrap();
        let second = detector.find_conflicts("q", &analyses).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(detector.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_cache_evicts_oldest_at_capacity() {
        let mut identifier = MockConflictIdentifier::new();
        identifier
            .expect_find_conflicts()
            .times(4)
            .returning(|question, _| Ok(vec![format!("conflict for {}", question)]));

        let detector = ConflictDetector::new(
            Arc::new(identifier),
            JudgeConfig::default().with_conflict_cache_capacity(2),
        );
        let analyses = vec![analysis(true, 0.8, &["x"], &[])];

        for question in ["q1", "q2", "q3"] {
            detector.find_conflicts(question, &analyses).await.unwrap();
        }
        assert_eq!(detector.cache_len(), 2);

        // q3 is still cached; q1 was evicted and needs a fourth call
        detector.find_conflicts("q3", &analyses).await.unwrap();
        let again = detector.find_conflicts("q1", &analyses).await.unwrap();
        assert_eq!(again, vec!["conflict for q1"]);
        assert_eq!(detector.cache_len(), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_calls_every_time() {
        let mut identifier = MockConflictIdentifier::new();
        identifier
            .expect_find_conflicts()
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let detector = ConflictDetector::new(
            Arc::new(identifier),
            JudgeConfig::default().with_conflict_cache(false),
        );
        let analyses = vec![analysis(true, 0.8, &["x"], &[])];

        detector.find_conflicts("q", &analyses).await.unwrap();
        detector.find_conflicts("q", &analyses).await.unwrap();
        assert_eq!(detector.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_identifier() {
        let mut identifier = MockConflictIdentifier::new();
        identifier.expect_find_conflicts().times(0);

        let detector = ConflictDetector::new(Arc::new(identifier), JudgeConfig::default());
        assert!(detector.find_conflicts("q", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identifier_error_is_conflict_check_error() {
        let mut identifier = MockConflictIdentifier::new();
        identifier
            .expect_find_conflicts()
            .returning(|_, _| Err(CapabilityError::Api("rate limited".into())));

        let detector = ConflictDetector::new(Arc::new(identifier), JudgeConfig::default());
        let err = detector
            .find_conflicts("q", &[analysis(false, 0.3, &[], &[])])
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::ConflictCheck(_)));
    }
}
