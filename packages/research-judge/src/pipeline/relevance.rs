//! Keyword relevance scoring and candidate conversion.
//!
//! The same scorer is applied to every connector's candidates so
//! cross-source ranking is consistent.

use crate::traits::connector::RawCandidate;
use crate::types::config::RelevanceWeights;
use crate::types::evidence::{Evidence, EvidenceOrigin, SourceMetadata};

/// Placeholder content for candidates without an abstract.
pub const NO_ABSTRACT: &str = "Abstract not available";

/// Score a candidate against a question with the default weights.
pub fn score(question: &str, title: &str, abstract_text: &str) -> f64 {
    score_with(&RelevanceWeights::default(), question, title, abstract_text)
}

/// Score a candidate against a question.
///
/// Keywords are the lower-cased whitespace-separated words of the question.
/// Each keyword counts once per field if it occurs anywhere in that field.
/// No stemming. Returns 0 for a question without keywords.
pub fn score_with(
    weights: &RelevanceWeights,
    question: &str,
    title: &str,
    abstract_text: &str,
) -> f64 {
    let question = question.to_lowercase();
    let keywords: Vec<&str> = question.split_whitespace().collect();
    if keywords.is_empty() {
        return 0.0;
    }

    let title = title.to_lowercase();
    let abstract_text = abstract_text.to_lowercase();

    let title_matches = keywords.iter().filter(|k| title.contains(*k)).count();
    let abstract_matches = keywords
        .iter()
        .filter(|k| abstract_text.contains(*k))
        .count();

    let raw = (title_matches as f64 * weights.title_weight
        + abstract_matches as f64 * weights.abstract_weight)
        / keywords.len() as f64;

    (raw * weights.boost).clamp(0.0, 1.0)
}

/// Pull up to three key findings out of an abstract.
pub fn extract_key_findings(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || text == NO_ABSTRACT {
        return vec!["No key findings available".to_string()];
    }

    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() <= 3 {
        return vec![format!("Finding: {}", text)];
    }

    sentences
        .iter()
        .take(3)
        .map(|s| format!("Finding: {}.", s))
        .collect()
}

/// Turn a scored candidate into evidence.
pub fn candidate_to_evidence(candidate: RawCandidate, score: f64, connector: &str) -> Evidence {
    let title = if candidate.title.trim().is_empty() {
        "Unknown Title".to_string()
    } else {
        candidate.title
    };

    let authors = if candidate.authors.is_empty() {
        vec!["Unknown".to_string()]
    } else {
        candidate.authors
    };

    let content = if candidate.abstract_text.trim().is_empty() {
        NO_ABSTRACT.to_string()
    } else {
        candidate.abstract_text
    };

    let key_findings = extract_key_findings(&content);

    Evidence {
        source: SourceMetadata {
            title,
            authors,
            published_date: candidate.year.unwrap_or_else(|| "Unknown".to_string()),
            publication: candidate.venue,
            url: candidate.url,
            citation_count: candidate.citation_count,
        },
        content,
        relevance_score: score,
        key_findings,
        origin: EvidenceOrigin::Retrieved {
            connector: connector.to_string(),
        },
    }
}
