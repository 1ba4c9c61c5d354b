//! Integration tests for the full judgment pipeline.
//!
//! These tests drive `ResearchJudge` end to end with deterministic mocks:
//! 1. Gather from connectors (or the synthetic fallback)
//! 2. Classify and partition
//! 3. Check for conflicts
//! 4. Synthesize the verdict

use std::sync::Arc;
use std::time::Duration;

use research_judge::{
    testing::{MockClassifier, MockConflictFinder, MockConnector, MockSynthesizer},
    CapabilityError, JudgeConfig, JudgeError, PipelineState, Query, RawCandidate, ResearchJudge,
    SourceConnector,
};
use tokio_util::sync::CancellationToken;

fn connectors(mocks: Vec<MockConnector>) -> Vec<Arc<dyn SourceConnector>> {
    mocks
        .into_iter()
        .map(|c| Arc::new(c) as Arc<dyn SourceConnector>)
        .collect()
}

fn coffee_query() -> Query {
    Query::new("Does coffee consumption reduce the risk of Parkinson's disease?")
        .unwrap()
        .with_domain("medical")
        .with_confidence_threshold(0.5)
        .with_evidence_count(3)
}

#[tokio::test]
async fn test_coffee_question_with_every_source_down() {
    let conflicts = Arc::new(
        MockConflictFinder::new().with_conflicts(vec!["Study 1 contradicts studies 2 and 3".into()]),
    );
    let synthesizer = Arc::new(MockSynthesizer::new());
    let judge = ResearchJudge::new(
        connectors(vec![
            MockConnector::new("academic").failing(),
            MockConnector::new("preprint").failing(),
            MockConnector::new("domain").failing(),
        ]),
        Arc::new(MockClassifier::new()),
        conflicts.clone(),
        synthesizer.clone(),
        JudgeConfig::default(),
    );

    let (run, result) = judge.run(&coffee_query(), &CancellationToken::new()).await;
    let judgment = result.unwrap();

    assert_eq!(run.state(), PipelineState::Done);
    assert!(judgment.used_synthetic_evidence());

    // Index 0 opposes, indices 1 and 2 support
    assert_eq!(judgment.supporting_evidence.len(), 2);
    assert_eq!(judgment.opposing_evidence.len(), 1);
    assert_eq!(judgment.opposing_evidence[0].relevance_score, 0.95);
    let supporting: Vec<f64> = judgment
        .supporting_evidence
        .iter()
        .map(|e| e.relevance_score)
        .collect();
    assert_eq!(supporting, vec![0.88, 0.81]);
    assert_eq!(judgment.verdict, "supported");

    // Conflicts and the full partition reach the synthesizer
    let calls = synthesizer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].supporting, 2);
    assert_eq!(calls[0].opposing, 1);
    assert_eq!(calls[0].conflicts, vec!["Study 1 contradicts studies 2 and 3"]);

    let conflict_calls = conflicts.calls();
    assert_eq!(conflict_calls.len(), 1);
    assert!(conflict_calls[0].1.starts_with("Analysis 1:\n- Supports claim: false\n"));
    assert!(conflict_calls[0].1.contains("Analysis 3:\n"));
}

#[tokio::test]
async fn test_one_source_answers_no_fallback() {
    let judge = ResearchJudge::new(
        connectors(vec![
            MockConnector::new("academic").with_candidates(vec![
                RawCandidate::new(
                    "Coffee consumption and risk of Parkinson's disease",
                    "https://academic/1",
                )
                .with_abstract("Coffee consumption was associated with reduced risk."),
                RawCandidate::new("Caffeine, coffee and Parkinson's disease risk", "https://academic/2")
                    .with_abstract("Does coffee reduce the risk? A meta-analysis of consumption."),
            ]),
            MockConnector::new("preprint"),
            MockConnector::new("domain"),
        ]),
        Arc::new(MockClassifier::new()),
        Arc::new(MockConflictFinder::new()),
        Arc::new(MockSynthesizer::new()),
        JudgeConfig::default(),
    );

    let query = coffee_query().with_evidence_count(5);
    let judgment = judge.judge(&query).await.unwrap();

    assert_eq!(judgment.evidence_count(), 2);
    assert!(!judgment.used_synthetic_evidence());
    assert!(judgment
        .supporting_evidence
        .iter()
        .chain(&judgment.opposing_evidence)
        .all(|e| e.relevance_score >= query.confidence_threshold()));
}

#[tokio::test]
async fn test_partition_is_exact_and_disjoint() {
    let titles = ["alpha one", "alpha two", "alpha three", "alpha four"];
    let candidates = titles
        .iter()
        .enumerate()
        .map(|(i, t)| RawCandidate::new(*t, format!("https://src/{}", i)))
        .collect();

    let classifier = MockClassifier::new()
        .with_stance("alpha one", true)
        .with_stance("alpha two", false)
        .with_stance("alpha three", false)
        .with_stance("alpha four", true);

    let judge = ResearchJudge::new(
        connectors(vec![MockConnector::new("src").with_candidates(candidates)]),
        Arc::new(classifier),
        Arc::new(MockConflictFinder::new()),
        Arc::new(MockSynthesizer::new()),
        JudgeConfig::default(),
    );

    let query = Query::new("alpha")
        .unwrap()
        .with_confidence_threshold(0.0)
        .with_evidence_count(10);
    let judgment = judge.judge(&query).await.unwrap();

    let supporting: Vec<&str> = judgment
        .supporting_evidence
        .iter()
        .map(|e| e.source.title.as_str())
        .collect();
    let opposing: Vec<&str> = judgment
        .opposing_evidence
        .iter()
        .map(|e| e.source.title.as_str())
        .collect();

    assert_eq!(supporting, vec!["alpha one", "alpha four"]);
    assert_eq!(opposing, vec!["alpha two", "alpha three"]);
    assert_eq!(judgment.verdict, "inconclusive");
}

#[tokio::test]
async fn test_classification_error_names_the_item() {
    let judge = ResearchJudge::new(
        connectors(vec![MockConnector::new("src").with_candidates(vec![
            RawCandidate::new("alpha good", "https://src/1"),
            RawCandidate::new("alpha broken", "https://src/2"),
        ])]),
        Arc::new(MockClassifier::new().failing_for(
            "alpha broken",
            CapabilityError::Parse("unexpected token".into()),
        )),
        Arc::new(MockConflictFinder::new()),
        Arc::new(MockSynthesizer::new()),
        JudgeConfig::default(),
    );

    let query = Query::new("alpha")
        .unwrap()
        .with_confidence_threshold(0.0);
    let err = judge.judge(&query).await.unwrap_err();

    assert!(err.to_string().contains("alpha broken"));
    assert!(matches!(err, JudgeError::Classification { .. }));
}

#[tokio::test]
async fn test_synthesis_failure_then_resynthesize() {
    let synthesizer =
        Arc::new(MockSynthesizer::new().failing_times(1, CapabilityError::Timeout { after_ms: 10 }));
    let connector = Arc::new(MockConnector::new("src").failing());
    let judge = ResearchJudge::new(
        vec![connector.clone() as Arc<dyn SourceConnector>],
        Arc::new(MockClassifier::new()),
        Arc::new(MockConflictFinder::new()),
        synthesizer.clone(),
        JudgeConfig::default(),
    );

    let query = coffee_query();
    let context = judge
        .judge(&query)
        .await
        .unwrap_err()
        .into_synthesis_context()
        .unwrap();

    let judgment = judge.resynthesize(&query, context).await.unwrap();
    assert_eq!(judgment.evidence_count(), 3);

    // Retrying synthesis did not gather again
    assert_eq!(connector.requested_limits().len(), 1);
    assert_eq!(synthesizer.calls().len(), 2);
}

#[tokio::test]
async fn test_cancel_with_fallback_disabled_fails_cleanly() {
    let judge = ResearchJudge::new(
        connectors(vec![MockConnector::new("slow").with_delay(Duration::from_secs(30))]),
        Arc::new(MockClassifier::new()),
        Arc::new(MockConflictFinder::new()),
        Arc::new(MockSynthesizer::new()),
        JudgeConfig::production(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let (run, result) = judge.run(&coffee_query(), &cancel).await;
    assert!(matches!(result, Err(JudgeError::Cancelled)));
    assert_eq!(run.state(), PipelineState::Failed);
}
