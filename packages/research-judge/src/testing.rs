//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the research judge
//! without making real inference or network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{CapabilityError, CapabilityResult, ConnectorError, ConnectorResult};
use crate::traits::{
    ai::{ConflictIdentifier, JudgmentSynthesizer, StanceClassifier, SynthesisOutput, SynthesisRequest},
    connector::{RawCandidate, SourceConnector},
};
use crate::types::evidence::{Evidence, EvidenceAnalysis};

/// Rebuild a capability error so a mock can hand it out more than once.
fn replicate(error: &CapabilityError) -> CapabilityError {
    match error {
        CapabilityError::MissingCredential { var } => {
            CapabilityError::MissingCredential { var: var.clone() }
        }
        CapabilityError::Http(e) => CapabilityError::Api(e.to_string()),
        CapabilityError::Api(msg) => CapabilityError::Api(msg.clone()),
        CapabilityError::Parse(msg) => CapabilityError::Parse(msg.clone()),
        CapabilityError::Timeout { after_ms } => CapabilityError::Timeout {
            after_ms: *after_ms,
        },
        CapabilityError::Cancelled => CapabilityError::Cancelled,
    }
}

/// A scripted failure: `remaining == None` fails forever.
struct MockFailure {
    remaining: Option<u32>,
    error: CapabilityError,
}

impl MockFailure {
    /// Consume one failure, if any is left.
    fn take(&mut self) -> Option<CapabilityError> {
        match &mut self.remaining {
            None => Some(replicate(&self.error)),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(replicate(&self.error))
            }
        }
    }
}

/// A mock source connector for testing.
///
/// Returns predefined candidates without making network requests.
#[derive(Default)]
pub struct MockConnector {
    name: String,

    /// Candidates returned on every search
    candidates: Vec<RawCandidate>,

    /// Whether every search fails
    fail: bool,

    /// Simulated latency
    delay: Option<Duration>,

    /// Only applies to this domain, if set
    domain: Option<String>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockConnectorCall>>>,
}

/// Record of a call made to the mock connector.
#[derive(Debug, Clone, PartialEq)]
pub struct MockConnectorCall {
    pub question: String,
    pub domain: String,
    pub max_results: usize,
}

impl MockConnector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Return these candidates from every search.
    pub fn with_candidates(mut self, candidates: Vec<RawCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Make every search fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Restrict the connector to one domain.
    pub fn for_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockConnectorCall> {
        self.calls.read().unwrap().clone()
    }

    /// The `max_results` of every search, in call order.
    pub fn requested_limits(&self) -> Vec<usize> {
        self.calls().iter().map(|c| c.max_results).collect()
    }
}

#[async_trait]
impl SourceConnector for MockConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies_to(&self, domain: &str) -> bool {
        self.domain.as_deref().map_or(true, |d| d == domain)
    }

    async fn search(
        &self,
        question: &str,
        domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        self.calls.write().unwrap().push(MockConnectorCall {
            question: question.to_string(),
            domain: domain.to_string(),
            max_results,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(ConnectorError::Status {
                connector: self.name.clone(),
                status: 503,
            });
        }

        Ok(self.candidates.clone())
    }
}

/// A mock stance classifier for testing.
///
/// Behavior is keyed by evidence title. Unknown titles get a default
/// analysis that opposes the claim only when the content opens with
/// "Contrary", which matches the synthetic generator's wording.
#[derive(Default)]
pub struct MockClassifier {
    /// Predefined analyses by title
    analyses: Arc<RwLock<HashMap<String, EvidenceAnalysis>>>,

    /// Simulated latency by title
    delays: Arc<RwLock<HashMap<String, Duration>>>,

    /// Scripted failures by title
    failures: Arc<RwLock<HashMap<String, MockFailure>>>,

    /// Titles classified, in call order
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the titled evidence with the given stance.
    pub fn with_stance(self, title: impl Into<String>, supports_claim: bool) -> Self {
        self.with_analysis(
            title,
            EvidenceAnalysis {
                supports_claim,
                confidence: 0.8,
                key_points: vec![],
                limitations: vec![],
            },
        )
    }

    /// Return this exact analysis for the titled evidence.
    pub fn with_analysis(self, title: impl Into<String>, analysis: EvidenceAnalysis) -> Self {
        self.analyses.write().unwrap().insert(title.into(), analysis);
        self
    }

    /// Sleep before classifying the titled evidence.
    pub fn with_delay(self, title: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(title.into(), delay);
        self
    }

    /// Always fail for the titled evidence.
    pub fn failing_for(self, title: impl Into<String>, error: CapabilityError) -> Self {
        self.failures.write().unwrap().insert(
            title.into(),
            MockFailure {
                remaining: None,
                error,
            },
        );
        self
    }

    /// Fail the first `times` calls for the titled evidence.
    pub fn failing_times(self, title: impl Into<String>, times: u32, error: CapabilityError) -> Self {
        self.failures.write().unwrap().insert(
            title.into(),
            MockFailure {
                remaining: Some(times),
                error,
            },
        );
        self
    }

    /// Titles classified, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn default_analysis(evidence: &Evidence) -> EvidenceAnalysis {
        EvidenceAnalysis {
            supports_claim: !evidence.content.starts_with("Contrary"),
            confidence: 0.8,
            key_points: evidence.key_findings.clone(),
            limitations: vec![],
        }
    }
}

#[async_trait]
impl StanceClassifier for MockClassifier {
    async fn classify(
        &self,
        _question: &str,
        evidence: &Evidence,
    ) -> CapabilityResult<EvidenceAnalysis> {
        let title = evidence.source.title.clone();
        self.calls.write().unwrap().push(title.clone());

        let delay = self.delays.read().unwrap().get(&title).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self
            .failures
            .write()
            .unwrap()
            .get_mut(&title)
            .and_then(MockFailure::take)
        {
            return Err(error);
        }

        Ok(self
            .analyses
            .read()
            .unwrap()
            .get(&title)
            .cloned()
            .unwrap_or_else(|| Self::default_analysis(evidence)))
    }
}

/// A mock conflict identifier for testing.
#[derive(Default)]
pub struct MockConflictFinder {
    conflicts: Vec<String>,
    failure: Arc<RwLock<Option<MockFailure>>>,

    /// (question, serialized analyses) per call
    calls: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockConflictFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these conflicts on every call.
    pub fn with_conflicts(mut self, conflicts: Vec<String>) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Fail every call.
    pub fn failing(self, error: CapabilityError) -> Self {
        *self.failure.write().unwrap() = Some(MockFailure {
            remaining: None,
            error,
        });
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ConflictIdentifier for MockConflictFinder {
    async fn find_conflicts(
        &self,
        question: &str,
        serialized_analyses: &str,
    ) -> CapabilityResult<Vec<String>> {
        self.calls
            .write()
            .unwrap()
            .push((question.to_string(), serialized_analyses.to_string()));

        if let Some(error) = self.failure.write().unwrap().as_mut().and_then(MockFailure::take) {
            return Err(error);
        }

        Ok(self.conflicts.clone())
    }
}

/// Record of a call made to the mock synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSynthesisCall {
    pub question: String,
    pub domain: String,
    pub supporting: usize,
    pub opposing: usize,
    pub conflicts: Vec<String>,
}

/// A mock judgment synthesizer for testing.
///
/// Without a predefined output it rules by majority: more supporting
/// evidence is "supported", more opposing is "refuted", a tie is
/// "inconclusive".
#[derive(Default)]
pub struct MockSynthesizer {
    output: Option<SynthesisOutput>,
    failure: Arc<RwLock<Option<MockFailure>>>,
    calls: Arc<RwLock<Vec<MockSynthesisCall>>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this output on every successful call.
    pub fn with_output(mut self, output: SynthesisOutput) -> Self {
        self.output = Some(output);
        self
    }

    /// Fail every call.
    pub fn failing(self, error: CapabilityError) -> Self {
        *self.failure.write().unwrap() = Some(MockFailure {
            remaining: None,
            error,
        });
        self
    }

    /// Fail the first `times` calls.
    pub fn failing_times(self, times: u32, error: CapabilityError) -> Self {
        *self.failure.write().unwrap() = Some(MockFailure {
            remaining: Some(times),
            error,
        });
        self
    }

    pub fn calls(&self) -> Vec<MockSynthesisCall> {
        self.calls.read().unwrap().clone()
    }

    fn majority(request: &SynthesisRequest<'_>) -> SynthesisOutput {
        let supporting = request.supporting.len();
        let opposing = request.opposing.len();
        let total = supporting + opposing;

        let verdict = match supporting.cmp(&opposing) {
            std::cmp::Ordering::Greater => "supported",
            std::cmp::Ordering::Less => "refuted",
            std::cmp::Ordering::Equal => "inconclusive",
        };
        let confidence = if total == 0 {
            0.0
        } else {
            supporting.max(opposing) as f64 / total as f64
        };

        SynthesisOutput {
            verdict: verdict.to_string(),
            confidence,
            reasoning: format!(
                "{} supporting and {} opposing sources, {} conflicts",
                supporting,
                opposing,
                request.conflicts.len()
            ),
            limitations: vec![],
            recommendation: None,
        }
    }
}

#[async_trait]
impl JudgmentSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesisOutput> {
        self.calls.write().unwrap().push(MockSynthesisCall {
            question: request.question.to_string(),
            domain: request.domain.to_string(),
            supporting: request.supporting.len(),
            opposing: request.opposing.len(),
            conflicts: request.conflicts.to_vec(),
        });

        if let Some(error) = self.failure.write().unwrap().as_mut().and_then(MockFailure::take) {
            return Err(error);
        }

        Ok(self
            .output
            .clone()
            .unwrap_or_else(|| Self::majority(request)))
    }
}
