//! Judgment synthesis - wrap the synthesizer's verdict into a [`Judgment`].

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{CapabilityError, JudgeError, Result};
use crate::traits::ai::{JudgmentSynthesizer, SynthesisRequest};
use crate::types::{
    config::JudgeConfig,
    evidence::{clamp_unit, Judgment, SynthesisContext},
    query::Query,
};

/// Verdict used when the synthesizer returns a blank one.
pub const INCONCLUSIVE: &str = "inconclusive";

/// Drives the judgment synthesizer capability.
#[derive(Clone)]
pub struct VerdictSynthesizer {
    synthesizer: Arc<dyn JudgmentSynthesizer>,
    config: JudgeConfig,
}

impl VerdictSynthesizer {
    pub fn new(synthesizer: Arc<dyn JudgmentSynthesizer>, config: JudgeConfig) -> Self {
        Self {
            synthesizer,
            config,
        }
    }

    /// Produce the final judgment.
    ///
    /// The evidence lists in the judgment are exactly those in `context`;
    /// only verdict, confidence, reasoning, limitations and recommendation
    /// come from the capability. On failure the context is handed back in
    /// `JudgeError::Synthesis`.
    pub async fn synthesize(
        &self,
        query: &Query,
        context: SynthesisContext,
        cancel: &CancellationToken,
    ) -> Result<Judgment> {
        let request = SynthesisRequest {
            question: query.question(),
            domain: query.domain(),
            supporting: &context.supporting,
            opposing: &context.opposing,
            conflicts: &context.conflicts,
        };

        let timeout = self.config.capability_timeout();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
            result = tokio::time::timeout(timeout, self.synthesizer.synthesize(&request)) => {
                result.unwrap_or(Err(CapabilityError::Timeout {
                    after_ms: self.config.capability_timeout_ms,
                }))
            }
        };

        let output = match result {
            Ok(output) => output,
            Err(source) => {
                return Err(JudgeError::Synthesis {
                    source,
                    context: Box::new(context),
                })
            }
        };

        let verdict = match output.verdict.trim() {
            "" => INCONCLUSIVE.to_string(),
            v => v.to_string(),
        };

        let judgment = Judgment {
            question: query.question().to_string(),
            verdict,
            confidence: clamp_unit(output.confidence),
            supporting_evidence: context.supporting,
            opposing_evidence: context.opposing,
            reasoning: output.reasoning,
            limitations: output.limitations,
            recommendation: output.recommendation.filter(|r| !r.trim().is_empty()),
        };

        info!(
            verdict = %judgment.verdict,
            confidence = judgment.confidence,
            "Judgment synthesized"
        );

        Ok(judgment)
    }
}
