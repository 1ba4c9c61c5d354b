//! Deterministic synthetic evidence for when no source answers.
//!
//! Output depends only on the query and [`SyntheticConfig`]. Every item is
//! tagged [`EvidenceOrigin::Synthetic`].

use crate::types::config::SyntheticConfig;
use crate::types::evidence::{clamp_unit, Evidence, EvidenceOrigin, SourceMetadata};
use crate::types::query::Query;

/// Generate `query.evidence_count()` synthetic evidence items.
///
/// Items whose index is a multiple of `oppose_every` carry opposing
/// content, the rest supporting content. Relevance starts at
/// `start_score` and drops by `score_step` per item.
pub fn generate(query: &Query, config: &SyntheticConfig) -> Vec<Evidence> {
    let topics = query.topic_words();
    let topic_phrase = topics.iter().take(3).cloned().collect::<Vec<_>>().join(" ");
    let short_topic = topics.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
    let domain = capitalize(query.domain());
    let label = config.source_label.as_str();

    (0..query.evidence_count())
        .map(|i| {
            let supports = supports_claim(i, config.oppose_every);

            let source = SourceMetadata {
                title: format!(
                    "{} of {} in {} Context",
                    if i % 2 == 0 { "Study" } else { "Analysis" },
                    topic_phrase,
                    domain
                ),
                authors: vec![
                    format!("Researcher {}", letter(b'A', i)),
                    format!("Professor {}", letter(b'K', i)),
                ],
                published_date: format!("202{}", i % 3),
                publication: Some(format!(
                    "{} Journal of {} Research",
                    capitalize(label),
                    domain
                )),
                url: format!("https://example.org/{}/{}", label, i),
                citation_count: Some(50u32.saturating_sub(7 * i as u32)),
            };

            let (content, key_findings) = if supports {
                (
                    format!(
                        "Our research strongly indicates that {}. Multiple experiments confirm this finding across different conditions.",
                        query.question()
                    ),
                    vec![
                        format!("Strong evidence supporting {}", short_topic),
                        format!("Consistent results across {} experiments", i + 3),
                        "Findings have been replicated by other researchers".to_string(),
                    ],
                )
            } else {
                (
                    format!(
                        "Contrary to popular belief, our research suggests that {} may not be accurate. Several experiments failed to replicate previously reported effects.",
                        query.question()
                    ),
                    vec![
                        format!("Limited evidence for {}", short_topic),
                        format!("Inconsistent results in {} experiments", i + 2),
                        "Methodological limitations in previous studies".to_string(),
                    ],
                )
            };

            Evidence {
                source,
                content,
                relevance_score: relevance_at(i, config),
                key_findings,
                origin: EvidenceOrigin::Synthetic,
            }
        })
        .collect()
}

/// Whether the synthetic item at `index` carries supporting content.
pub fn supports_claim(index: usize, oppose_every: usize) -> bool {
    oppose_every == 0 || index % oppose_every != 0
}

/// Relevance of the synthetic item at `index`, rounded to 2 decimals.
pub fn relevance_at(index: usize, config: &SyntheticConfig) -> f64 {
    let raw = config.start_score - index as f64 * config.score_step;
    clamp_unit((raw * 100.0).round() / 100.0)
}

fn letter(base: u8, offset: usize) -> char {
    char::from(base.saturating_add(offset as u8))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coffee_query(count: usize) -> Query {
        Query::new("Does coffee consumption reduce the risk of Parkinson's disease?")
            .unwrap()
            .with_domain("medical")
            .with_confidence_threshold(0.5)
            .with_evidence_count(count)
    }

    #[test]
    fn test_coffee_scenario() {
        let evidence = generate(&coffee_query(3), &SyntheticConfig::default());

        assert_eq!(evidence.len(), 3);
        let scores: Vec<f64> = evidence.iter().map(|e| e.relevance_score).collect();
        assert_eq!(scores, vec![0.95, 0.88, 0.81]);

        assert!(evidence[0].content.starts_with("Contrary to popular belief"));
        assert!(evidence[1].content.starts_with("Our research strongly indicates"));
        assert!(evidence[2].content.starts_with("Our research strongly indicates"));
        assert!(evidence.iter().all(Evidence::is_synthetic));
    }

    #[test]
    fn test_metadata_shape() {
        let evidence = generate(&coffee_query(2), &SyntheticConfig::default());

        let first = &evidence[0].source;
        assert_eq!(
            first.title,
            "Study of does coffee consumption in Medical Context"
        );
        assert_eq!(first.authors, vec!["Researcher A", "Professor K"]);
        assert_eq!(first.published_date, "2020");
        assert_eq!(
            first.publication.as_deref(),
            Some("General Journal of Medical Research")
        );
        assert_eq!(first.url, "https://example.org/general/0");
        assert_eq!(first.citation_count, Some(50));

        let second = &evidence[1].source;
        assert!(second.title.starts_with("Analysis of"));
        assert_eq!(second.authors, vec!["Researcher B", "Professor L"]);
        assert_eq!(second.citation_count, Some(43));
    }

    #[test]
    fn test_two_of_three_support() {
        let evidence = generate(&coffee_query(9), &SyntheticConfig::default());
        let supporting = evidence
            .iter()
            .filter(|e| e.content.starts_with("Our research"))
            .count();
        assert_eq!(supporting, 6);
    }

    #[test]
    fn test_long_runs_stay_in_range() {
        let evidence = generate(&coffee_query(20), &SyntheticConfig::default());
        assert_eq!(evidence.len(), 20);
        assert!(evidence
            .iter()
            .all(|e| (0.0..=1.0).contains(&e.relevance_score)));
        assert_eq!(evidence[19].source.citation_count, Some(0));
        // Strictly decreasing until the floor
        assert!(evidence[0].relevance_score > evidence[13].relevance_score);
    }

    #[test]
    fn test_deterministic() {
        let config = SyntheticConfig::default();
        assert_eq!(
            generate(&coffee_query(5), &config),
            generate(&coffee_query(5), &config)
        );
    }
}
