//! Pipeline run record and its state machine.
//!
//! A run moves forward through the stages exactly once:
//!
//! ```text
//! Idle -> Gathering -> Analyzing -> ConflictChecking -> Synthesizing -> Done
//!              \            \              \                 \
//!               +------------+--------------+-----------------+--> Failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Stage of a single judgment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Gathering,
    Analyzing,
    ConflictChecking,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Gathering => "gathering",
            PipelineState::Analyzing => "analyzing",
            PipelineState::ConflictChecking => "conflict_checking",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether `next` directly follows `self`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Idle, Gathering)
                | (Gathering, Analyzing)
                | (Analyzing, ConflictChecking)
                | (ConflictChecking, Synthesizing)
                | (Synthesizing, Done)
                | (Gathering | Analyzing | ConflictChecking | Synthesizing, Failed)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal pipeline transition from {from} to {to}")]
pub struct TransitionError {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub at: DateTime<Utc>,
}

/// Record of one pass through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Time-ordered run id (UUID v7)
    pub id: Uuid,

    pub started_at: DateTime<Utc>,

    state: PipelineState,

    history: Vec<StateTransition>,

    /// Why the run failed, if it did
    failure: Option<String>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: Utc::now(),
            state: PipelineState::Idle,
            history: Vec::new(),
            failure: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Stages visited, starting with `Idle`.
    pub fn path(&self) -> Vec<PipelineState> {
        std::iter::once(PipelineState::Idle)
            .chain(self.history.iter().map(|t| t.to))
            .collect()
    }

    /// Move to `next`, rejecting anything but the next stage or `Failed`.
    pub fn advance(&mut self, next: PipelineState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }

        debug!(run_id = %self.id, from = %self.state, to = %next, "Pipeline transition");
        self.history.push(StateTransition {
            from: self.state,
            to: next,
            at: Utc::now(),
        });
        self.state = next;
        Ok(())
    }

    /// Mark the run failed. No-op once terminal or while still idle.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.advance(PipelineState::Failed).is_ok() {
            self.failure = Some(reason.into());
        }
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    #[test]
    fn test_happy_path() {
        let mut run = PipelineRun::new();
        for next in [Gathering, Analyzing, ConflictChecking, Synthesizing, Done] {
            run.advance(next).unwrap();
        }

        assert_eq!(run.state(), Done);
        assert_eq!(
            run.path(),
            vec![Idle, Gathering, Analyzing, ConflictChecking, Synthesizing, Done]
        );
        assert!(run
            .history()
            .windows(2)
            .all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_no_skipping_or_reentry() {
        let mut run = PipelineRun::new();
        assert_eq!(
            run.advance(Analyzing),
            Err(TransitionError {
                from: Idle,
                to: Analyzing
            })
        );

        run.advance(Gathering).unwrap();
        run.advance(Analyzing).unwrap();
        assert!(run.advance(Gathering).is_err());
        assert!(run.advance(Analyzing).is_err());
        assert_eq!(run.state(), Analyzing);
    }

    #[test]
    fn test_failure_only_from_active_stages() {
        assert!(!Idle.can_transition_to(Failed));
        assert!(!Done.can_transition_to(Failed));
        for stage in [Gathering, Analyzing, ConflictChecking, Synthesizing] {
            assert!(stage.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_fail_records_reason_once() {
        let mut run = PipelineRun::new();
        run.advance(Gathering).unwrap();
        run.fail("all connectors failed");
        run.fail("second reason");

        assert_eq!(run.state(), Failed);
        assert_eq!(run.failure(), Some("all connectors failed"));
        assert!(run.state().is_terminal());
    }

    #[test]
    fn test_run_ids_are_v7() {
        let run = PipelineRun::new();
        assert_eq!(run.id.get_version_num(), 7);
    }
}
