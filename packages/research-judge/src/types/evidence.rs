//! Evidence, per-item analyses and the final judgment.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Provenance of one evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub title: String,

    /// Authors in publication order
    pub authors: Vec<String>,

    /// Publication date as reported by the source (often just a year)
    pub published_date: String,

    /// Journal, venue or archive name
    pub publication: Option<String>,

    pub url: String,

    pub citation_count: Option<u32>,
}

/// Where an evidence item came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceOrigin {
    /// Returned by a live source connector
    Retrieved { connector: String },

    /// Generated by the deterministic fallback; not real research
    Synthetic,
}

/// One retrieved research artifact with its relevance.
///
/// Never mutated after the dispatcher admits it. Analyses are kept in a
/// parallel list, not attached to the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: SourceMetadata,

    pub content: String,

    /// Relevance to the question (0.0 to 1.0)
    pub relevance_score: f64,

    pub key_findings: Vec<String>,

    pub origin: EvidenceOrigin,
}

impl Evidence {
    /// Whether this item came from the synthetic fallback.
    pub fn is_synthetic(&self) -> bool {
        self.origin == EvidenceOrigin::Synthetic
    }

    /// Key used to detect the same artifact returned by two connectors.
    ///
    /// Uses the URL when present, otherwise the normalized title.
    pub fn dedup_key(&self) -> String {
        let url = self.source.url.trim().trim_end_matches('/').to_lowercase();
        if url.is_empty() {
            format!(
                "title:{}",
                self.source
                    .title
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            )
        } else {
            format!("url:{}", url)
        }
    }
}

/// The stance classifier's view of a single evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceAnalysis {
    /// Whether the evidence supports the claim in the question
    pub supports_claim: bool,

    /// Classifier confidence (0.0 to 1.0)
    pub confidence: f64,

    pub key_points: Vec<String>,

    pub limitations: Vec<String>,
}

impl EvidenceAnalysis {
    /// Clamp confidence into `[0, 1]`; non-finite values become 0.
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_unit(self.confidence);
        self
    }
}

/// Final, immutable output of a judgment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub question: String,

    /// Natural-language verdict, e.g. "supported", "refuted", "inconclusive"
    pub verdict: String,

    /// Confidence in the verdict (0.0 to 1.0)
    pub confidence: f64,

    pub supporting_evidence: Vec<Evidence>,

    pub opposing_evidence: Vec<Evidence>,

    pub reasoning: String,

    pub limitations: Vec<String>,

    pub recommendation: Option<String>,
}

impl Judgment {
    /// Total evidence items the verdict was based on.
    pub fn evidence_count(&self) -> usize {
        self.supporting_evidence.len() + self.opposing_evidence.len()
    }

    /// Whether any evidence behind the verdict is synthetic.
    pub fn used_synthetic_evidence(&self) -> bool {
        self.supporting_evidence
            .iter()
            .chain(&self.opposing_evidence)
            .any(Evidence::is_synthetic)
    }
}

/// Everything the synthesizer needs besides the query.
///
/// Returned inside `JudgeError::Synthesis` so synthesis can be retried
/// without gathering and classifying again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisContext {
    pub supporting: Vec<Evidence>,
    pub opposing: Vec<Evidence>,
    pub conflicts: Vec<String>,
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(url: &str, title: &str) -> Evidence {
        Evidence {
            source: SourceMetadata {
                title: title.to_string(),
                authors: vec!["A. Author".to_string()],
                published_date: "2021".to_string(),
                publication: None,
                url: url.to_string(),
                citation_count: Some(3),
            },
            content: "content".to_string(),
            relevance_score: 0.8,
            key_findings: vec![],
            origin: EvidenceOrigin::Retrieved {
                connector: "arxiv".to_string(),
            },
        }
    }

    #[test]
    fn test_dedup_key_prefers_url() {
        let a = evidence("https://arxiv.org/abs/1234/", "One");
        let b = evidence("HTTPS://arxiv.org/abs/1234", "Two");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_falls_back_to_title() {
        let a = evidence("", "Coffee  and Parkinson's");
        let b = evidence(" ", "coffee and parkinson's");
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert!(a.dedup_key().starts_with("title:"));
    }

    #[test]
    fn test_analysis_normalized() {
        let analysis = EvidenceAnalysis {
            supports_claim: true,
            confidence: 1.7,
            key_points: vec![],
            limitations: vec![],
        };
        assert_eq!(analysis.normalized().confidence, 1.0);

        let analysis = EvidenceAnalysis {
            supports_claim: false,
            confidence: f64::NAN,
            key_points: vec![],
            limitations: vec![],
        };
        assert_eq!(analysis.normalized().confidence, 0.0);
    }

    #[test]
    fn test_origin_serializes_tagged() {
        let json = serde_json::to_string(&EvidenceOrigin::Synthetic).unwrap();
        assert_eq!(json, r#"{"kind":"synthetic"}"#);
    }
}
