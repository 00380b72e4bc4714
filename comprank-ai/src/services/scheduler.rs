//! Step scheduler
//!
//! One call to [`tick`] is one unit of work:
//! - LOADING: activate the queue (no rating call)
//! - ACTIVE with rows left: rate exactly one row
//! - ACTIVE with the cursor at the end: materialize and complete (no rating call)
//! - anything else: nothing
//!
//! The caller must hold exclusive access to the job for the whole tick and
//! persist it before the next one. Concurrent ticks on one job are not
//! supported.

use serde::Serialize;

use crate::error::JobError;
use crate::models::{Job, JobState, RowErrorReport};
use crate::services::materializer::materialize;
use crate::services::rater::{Rating, SimilarityRater};

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// No job submitted yet
    Idle,
    /// LOADING → ACTIVE
    Activated { total: usize },
    /// One row rated
    Advanced {
        row_index: usize,
        score: u8,
        cursor: usize,
        total: usize,
    },
    /// ACTIVE → COMPLETE, result materialized
    Completed { rows: usize, strong_matches: usize },
    /// Job is COMPLETE or FAILED; ticking does nothing until reset
    Halted { state: JobState },
}

impl TickOutcome {
    /// Whether another tick would make progress
    pub fn has_more_work(&self) -> bool {
        matches!(self, TickOutcome::Activated { .. } | TickOutcome::Advanced { .. })
    }
}

/// Advance `job` by one unit of work
pub async fn tick(job: &mut Job, rater: &SimilarityRater) -> TickOutcome {
    match job.state() {
        JobState::Idle => TickOutcome::Idle,
        JobState::Loading => match job.activate() {
            Ok(_) => TickOutcome::Activated {
                total: job.progress.total,
            },
            Err(e) => fail(job, e),
        },
        JobState::Active if job.progress.cursor >= job.progress.total => match complete(job) {
            Ok(outcome) => outcome,
            Err(e) => fail(job, e),
        },
        JobState::Active => {
            let row_index = job.progress.cursor;
            match step(job, rater).await {
                Ok(score) => TickOutcome::Advanced {
                    row_index,
                    score,
                    cursor: job.progress.cursor,
                    total: job.progress.total,
                },
                Err(e) => fail(job, e),
            }
        }
        state @ (JobState::Complete | JobState::Failed) => TickOutcome::Halted { state },
    }
}

/// Rate the row under the cursor and advance the cursor by one
///
/// Returns the score written. The job is only touched after the rating call
/// returns, so an interrupted step leaves it as it was.
pub async fn step(job: &mut Job, rater: &SimilarityRater) -> Result<u8, JobError> {
    let (description, target) = {
        let index = check_steppable(job)?;
        let queue = job
            .queue
            .as_ref()
            .ok_or_else(|| JobError::Unrecoverable("active job has no row queue".to_string()))?;
        let description = queue.description(index).ok_or_else(|| {
            JobError::Unrecoverable(format!("row {} has no Description cell", index))
        })?;
        let target = job
            .target
            .as_ref()
            .ok_or_else(|| JobError::Unrecoverable("active job has no target description".to_string()))?;
        (description.to_string(), target.as_str().to_string())
    };

    let rating = rater.rate(&description, &target).await;
    apply_rating(job, rating)
}

/// Write `rating` into the row under the cursor and advance the cursor
///
/// Pure with respect to the job: the same job and rating always give the
/// same score and cursor, which makes steps replayable.
pub fn apply_rating(job: &mut Job, rating: Rating) -> Result<u8, JobError> {
    let index = check_steppable(job)?;

    job.queue
        .as_mut()
        .ok_or_else(|| JobError::Unrecoverable("active job has no row queue".to_string()))?
        .set_score(index, rating.score)?;

    if let Some(error) = rating.error {
        tracing::warn!(row = index, score = rating.score, error = %error, "Row scored with fallback");
        job.add_error(RowErrorReport::warning(index, "RATING_FALLBACK", error));
    }

    job.progress.cursor += 1;
    tracing::debug!(
        row = index,
        score = rating.score,
        cursor = job.progress.cursor,
        total = job.progress.total,
        "Row rated"
    );

    Ok(rating.score)
}

/// ACTIVE → COMPLETE once every row is rated
pub fn complete(job: &mut Job) -> Result<TickOutcome, JobError> {
    if job.progress.cursor != job.progress.total {
        return Err(JobError::Conflict(format!(
            "cannot complete with {} of {} rows rated",
            job.progress.cursor, job.progress.total
        )));
    }

    let queue = job
        .queue
        .as_ref()
        .ok_or_else(|| JobError::Unrecoverable("active job has no row queue".to_string()))?;
    let result = materialize(queue);
    let outcome = TickOutcome::Completed {
        rows: result.len(),
        strong_matches: result.strong_matches,
    };

    job.transition_to(JobState::Complete)?;
    job.result = Some(result);

    tracing::info!(?outcome, "Job complete");
    Ok(outcome)
}

/// Index of the row a step would rate, after checking the job can step
fn check_steppable(job: &Job) -> Result<usize, JobError> {
    if job.state() != JobState::Active {
        return Err(JobError::Conflict(format!(
            "cannot step a job in state {:?}",
            job.state()
        )));
    }

    let cursor = job.progress.cursor;
    let total = job.progress.total;
    if cursor >= total {
        return Err(JobError::Conflict("every row is already rated".to_string()));
    }

    let queue_len = job.queue.as_ref().map(|q| q.len()).unwrap_or(0);
    if queue_len != total {
        return Err(JobError::Unrecoverable(format!(
            "row queue holds {} rows but progress expects {}",
            queue_len, total
        )));
    }

    Ok(cursor)
}

/// Move the job to FAILED, keeping the cursor where it stopped
fn fail(job: &mut Job, error: JobError) -> TickOutcome {
    tracing::error!(
        cursor = job.progress.cursor,
        total = job.progress.total,
        error = %error,
        "Job failed"
    );

    let row_index = (job.state() == JobState::Active).then_some(job.progress.cursor);
    job.add_error(RowErrorReport::critical(row_index, "UNRECOVERABLE", error.to_string()));

    if let Err(e) = job.transition_to(JobState::Failed) {
        tracing::error!(error = %e, "Could not mark job as failed");
    }

    TickOutcome::Halted { state: job.state() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row_queue::HEADER_SKIP_ROWS;
    use crate::models::RawTable;
    use crate::services::chat_client::{ChatBackend, ChatRequest, RaterError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers with the candidate's length, capped at 10
    struct LengthBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for LengthBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<String, RaterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = &request.messages[1].content;
            let candidate = prompt.rsplit("Candidate:\n").next().unwrap_or_default();
            Ok(candidate.len().min(10).to_string())
        }
    }

    fn rater() -> (SimilarityRater, Arc<LengthBackend>) {
        let backend = Arc::new(LengthBackend {
            calls: AtomicUsize::new(0),
        });
        (SimilarityRater::new(backend.clone(), "test-model"), backend)
    }

    fn submitted_job(descriptions: &[&str]) -> Job {
        let mut rows = vec![vec!["meta".to_string()]; HEADER_SKIP_ROWS];
        rows.push(vec!["Description".to_string()]);
        rows.extend(descriptions.iter().map(|d| vec![d.to_string()]));
        rows.push(vec!["Total".to_string()]);
        rows.push(vec!["Footer".to_string()]);

        let mut job = Job::new();
        job.set_target("Target").unwrap();
        job.submit(&RawTable::new(rows)).unwrap();
        job
    }

    #[tokio::test]
    async fn test_tick_sequence() {
        let (rater, backend) = rater();
        let mut job = submitted_job(&["aaaa", "bb"]);

        assert_eq!(tick(&mut job, &rater).await, TickOutcome::Activated { total: 2 });
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            tick(&mut job, &rater).await,
            TickOutcome::Advanced { row_index: 0, score: 4, cursor: 1, total: 2 }
        );
        assert_eq!(
            tick(&mut job, &rater).await,
            TickOutcome::Advanced { row_index: 1, score: 2, cursor: 2, total: 2 }
        );
        assert_eq!(job.state(), JobState::Active);

        let outcome = tick(&mut job, &rater).await;
        assert_eq!(outcome, TickOutcome::Completed { rows: 2, strong_matches: 1 });
        assert!(!outcome.has_more_work());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(job.state(), JobState::Complete);
        assert_eq!(job.progress.cursor, job.progress.total);

        assert_eq!(
            tick(&mut job, &rater).await,
            TickOutcome::Halted { state: JobState::Complete }
        );
    }

    #[tokio::test]
    async fn test_idle_tick_does_nothing() {
        let (rater, _) = rater();
        let mut job = Job::new();
        assert_eq!(tick(&mut job, &rater).await, TickOutcome::Idle);
        assert_eq!(job, Job::new());
    }

    #[tokio::test]
    async fn test_empty_queue_completes_without_calls() {
        let (rater, backend) = rater();
        let mut job = submitted_job(&[]);

        assert_eq!(tick(&mut job, &rater).await, TickOutcome::Activated { total: 0 });
        assert_eq!(
            tick(&mut job, &rater).await,
            TickOutcome::Completed { rows: 0, strong_matches: 0 }
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_queue_fails_job() {
        let (rater, _) = rater();
        let mut job = submitted_job(&["aaaa", "bb"]);
        tick(&mut job, &rater).await;
        tick(&mut job, &rater).await;

        // Persisted state claiming more rows than the queue holds
        job.progress.total = 5;

        let outcome = tick(&mut job, &rater).await;
        assert_eq!(outcome, TickOutcome::Halted { state: JobState::Failed });
        assert_eq!(job.progress.cursor, 1);
        assert_eq!(job.errors.last().map(|e| e.error_code.as_str()), Some("UNRECOVERABLE"));
    }

    #[test]
    fn test_apply_rating_records_fallback_error() {
        let mut job = submitted_job(&["aaaa"]);
        job.activate().unwrap();

        let score = apply_rating(&mut job, Rating::fallback("API error: timeout".to_string())).unwrap();

        assert_eq!(score, 10);
        assert_eq!(job.progress.cursor, 1);
        assert_eq!(job.errors.len(), 1);
        assert_eq!(job.errors[0].row_index, Some(0));
        assert_eq!(job.errors[0].error_code, "RATING_FALLBACK");
    }

    #[test]
    fn test_apply_rating_rejects_non_active() {
        let mut job = submitted_job(&["aaaa"]);
        assert!(matches!(
            apply_rating(&mut job, Rating::scored(3)),
            Err(JobError::Conflict(_))
        ));
    }
}
