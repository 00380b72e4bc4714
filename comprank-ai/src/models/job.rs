//! Job state machine
//!
//! A job progresses through:
//! IDLE → LOADING → ACTIVE → COMPLETE
//!
//! ACTIVE (or LOADING, on a corrupt queue) → FAILED on an unrecoverable error.
//! COMPLETE and FAILED only return to IDLE through an explicit reset, which
//! replaces the whole job.

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::models::{RawTable, RowErrorReport, RowQueue, SortedResult};

/// Batch state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// No upload accepted yet
    #[default]
    Idle,
    /// Queue built, waiting for the first tick
    Loading,
    /// Rows being rated, one per tick
    Active,
    /// Every row rated, sorted result available
    Complete,
    /// Halted on an unrecoverable error
    Failed,
}

impl JobState {
    /// Forward transitions permitted outside of reset
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Idle, JobState::Loading)
                | (JobState::Loading, JobState::Active)
                | (JobState::Loading, JobState::Failed)
                | (JobState::Active, JobState::Complete)
                | (JobState::Active, JobState::Failed)
        )
    }

    /// COMPLETE or FAILED
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

/// State transition event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: JobState,
    pub new_state: JobState,
}

/// Reference text every row is rated against
///
/// Never empty; fixed for the lifetime of the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetDescription(String);

impl TargetDescription {
    pub fn new(text: impl Into<String>) -> Result<Self, JobError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(JobError::Validation(
                "target description must not be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TargetDescription {
    type Error = JobError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl From<TargetDescription> for String {
    fn from(target: TargetDescription) -> Self {
        target.0
    }
}

/// Cursor into the row queue plus the batch state
///
/// `cursor <= total` always holds. A COMPLETE job has `cursor == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub cursor: usize,
    pub total: usize,
    pub state: JobState,
}

impl BatchProgress {
    /// Percentage complete (0.0 - 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.cursor as f64 / self.total as f64) * 100.0
        } else if self.state == JobState::Complete {
            100.0
        } else {
            0.0
        }
    }

    /// Rows left to rate
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.cursor)
    }
}

/// One similarity rating job
///
/// The host owns the value and hands it back on every tick. Reset replaces
/// it with `Job::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Reference description, set once before upload
    pub target: Option<TargetDescription>,

    /// Rows built from the upload
    pub queue: Option<RowQueue>,

    /// Cursor and state
    pub progress: BatchProgress,

    /// Sorted rows, cached once COMPLETE
    pub result: Option<SortedResult>,

    /// Row fallbacks and the failure that halted the job, if any
    pub errors: Vec<RowErrorReport>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> JobState {
        self.progress.state
    }

    /// Set the target description
    ///
    /// Allowed once, while IDLE. An empty description is rejected without
    /// touching the job.
    pub fn set_target(&mut self, text: &str) -> Result<(), JobError> {
        let target = TargetDescription::new(text)?;

        if self.state() != JobState::Idle || self.target.is_some() {
            return Err(JobError::Conflict(
                "target description is already set for this job; reset to start over".to_string(),
            ));
        }

        self.target = Some(target);
        Ok(())
    }

    /// Submit an upload: IDLE → LOADING
    ///
    /// Returns `Ok(false)` without doing anything when the job has already
    /// left IDLE, so a stale resubmission never rebuilds or restarts it.
    /// The queue is built before any mutation; a validation failure leaves
    /// the job exactly as it was.
    pub fn submit(&mut self, table: &RawTable) -> Result<bool, JobError> {
        if self.state() != JobState::Idle {
            tracing::debug!(state = ?self.state(), "Ignoring upload for a job already past IDLE");
            return Ok(false);
        }

        if self.target.is_none() {
            return Err(JobError::Conflict(
                "set a target description before uploading".to_string(),
            ));
        }

        let queue = RowQueue::build(table)?;
        tracing::info!(rows = queue.len(), "Row queue built from upload");

        self.queue = Some(queue);
        self.transition_to(JobState::Loading)?;
        Ok(true)
    }

    /// LOADING → ACTIVE with the cursor at the first row
    pub fn activate(&mut self) -> Result<StateTransition, JobError> {
        let total = self
            .queue
            .as_ref()
            .map(RowQueue::len)
            .ok_or_else(|| JobError::Unrecoverable("job is loading without a row queue".to_string()))?;

        let transition = self.transition_to(JobState::Active)?;
        self.progress.cursor = 0;
        self.progress.total = total;
        Ok(transition)
    }

    /// Transition to new state
    ///
    /// Only the forward edges of the state machine are accepted.
    pub fn transition_to(&mut self, new_state: JobState) -> Result<StateTransition, JobError> {
        let old_state = self.progress.state;
        if !old_state.can_transition_to(new_state) {
            return Err(JobError::Conflict(format!(
                "invalid job transition {:?} -> {:?}",
                old_state, new_state
            )));
        }

        self.progress.state = new_state;
        tracing::info!(?old_state, ?new_state, cursor = self.progress.cursor, "Job state transition");

        Ok(StateTransition {
            old_state,
            new_state,
        })
    }

    /// Add error to job
    pub fn add_error(&mut self, error: RowErrorReport) {
        self.errors.push(error);
    }

    /// Replace the job with a fresh one, dropping every field at once
    pub fn reset(&mut self) {
        *self = Job::default();
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}
