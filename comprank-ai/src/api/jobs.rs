//! Job API handlers
//!
//! POST /job/target, POST /job/upload, POST /job/tick, GET /job/status,
//! GET /job/results, GET /job/export, POST /job/reset
//!
//! Every mutating handler holds `job_lock` across load → mutate → save, so
//! two browser tabs ticking at once still rate each row exactly once.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::require_session;
use crate::db::jobs::{delete_job, load_or_new, save_job};
use crate::error::{ApiError, ApiResult};
use crate::models::{BatchProgress, Job, JobState, RowErrorReport};
use crate::services::export::{to_csv, EXPORT_FILENAME, EXPORT_MIME};
use crate::services::{read_table_bytes, tick, TickOutcome};
use crate::AppState;

/// Largest accepted upload; axum's default of 2 MiB is too small for exports
pub const UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// POST /job/target request
#[derive(Debug, Deserialize)]
pub struct SetTargetRequest {
    pub target: String,
}

/// Job snapshot returned by most endpoints
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub state: JobState,
    pub cursor: usize,
    pub total: usize,
    pub percentage: f64,
    pub target: Option<String>,
    pub errors: Vec<RowErrorReport>,
    /// Present once the job is COMPLETE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_matches: Option<usize>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        let BatchProgress { cursor, total, state } = job.progress;
        Self {
            state,
            cursor,
            total,
            percentage: job.progress.percentage(),
            target: job.target.as_ref().map(|t| t.as_str().to_string()),
            errors: job.errors.clone(),
            strong_matches: job.result.as_ref().map(|r| r.strong_matches),
        }
    }
}

/// POST /job/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// False when the job had already left IDLE and the upload was ignored
    pub accepted: bool,
    pub status: JobStatusResponse,
}

/// POST /job/tick response
#[derive(Debug, Serialize)]
pub struct TickResponse {
    #[serde(flatten)]
    pub outcome: TickOutcome,
    pub has_more_work: bool,
    pub status: JobStatusResponse,
}

/// GET /job/results response
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub strong_matches: usize,
    pub total: usize,
}

/// POST /job/target
///
/// 400 on an empty description, 409 once a target is set.
pub async fn set_target(
    State(state): State<AppState>,
    Json(request): Json<SetTargetRequest>,
) -> ApiResult<Json<JobStatusResponse>> {
    let _guard = state.job_lock.lock().await;

    let mut job = load_or_new(&state.db).await?;
    job.set_target(&request.target)?;
    save_job(&state.db, &job).await?;

    tracing::info!(chars = request.target.len(), "Target description set");
    Ok(Json(JobStatusResponse::from(&job)))
}

/// POST /job/upload
///
/// Body is the export itself, an .xlsx workbook or CSV text, at most
/// [`UPLOAD_LIMIT_BYTES`]. IDLE → LOADING; a job past IDLE ignores
/// the upload. A malformed upload is rejected with 400 and nothing stored.
pub async fn upload(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<UploadResponse>> {
    let _guard = state.job_lock.lock().await;

    let mut job = load_or_new(&state.db).await?;
    if job.state() != JobState::Idle {
        tracing::info!(state = ?job.state(), "Upload ignored, job already submitted");
        return Ok(Json(UploadResponse {
            accepted: false,
            status: JobStatusResponse::from(&job),
        }));
    }

    let table = read_table_bytes(&body)?;
    let accepted = job.submit(&table)?;
    if accepted {
        save_job(&state.db, &job).await?;
    }

    Ok(Json(UploadResponse {
        accepted,
        status: JobStatusResponse::from(&job),
    }))
}

/// POST /job/tick
///
/// Advances the job by exactly one unit of work and persists it.
pub async fn tick_job(State(state): State<AppState>) -> ApiResult<Json<TickResponse>> {
    let _guard = state.job_lock.lock().await;

    let mut job = load_or_new(&state.db).await?;
    let outcome = tick(&mut job, &state.rater).await;

    if outcome != TickOutcome::Idle {
        save_job(&state.db, &job).await?;
    }

    if job.state() == JobState::Failed {
        if let Some(report) = job.errors.last() {
            state.record_error(report.error_message.clone()).await;
        }
    }

    Ok(Json(TickResponse {
        has_more_work: outcome.has_more_work(),
        outcome,
        status: JobStatusResponse::from(&job),
    }))
}

/// GET /job/status
pub async fn job_status(State(state): State<AppState>) -> ApiResult<Json<JobStatusResponse>> {
    let job = load_or_new(&state.db).await?;
    Ok(Json(JobStatusResponse::from(&job)))
}

/// GET /job/results
///
/// 409 until the job is COMPLETE.
pub async fn job_results(State(state): State<AppState>) -> ApiResult<Json<ResultsResponse>> {
    let job = load_or_new(&state.db).await?;
    let (queue, result) = completed_parts(&job)?;

    Ok(Json(ResultsResponse {
        columns: result.columns.clone(),
        rows: result.rows.iter().map(|row| queue.output_record(row)).collect(),
        strong_matches: result.strong_matches,
        total: result.len(),
    }))
}

/// GET /job/export
///
/// Sorted result as a CSV attachment.
pub async fn export_results(State(state): State<AppState>) -> ApiResult<Response> {
    let job = load_or_new(&state.db).await?;
    let (queue, result) = completed_parts(&job)?;
    let csv = to_csv(queue, result)?;

    Ok((
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", EXPORT_MIME)),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}

/// POST /job/reset
///
/// Drops the whole job in one step; the next status is a fresh IDLE job.
pub async fn reset_job(State(state): State<AppState>) -> ApiResult<Json<JobStatusResponse>> {
    let _guard = state.job_lock.lock().await;

    delete_job(&state.db).await?;
    *state.last_error.write().await = None;
    tracing::info!("Job reset");

    Ok(Json(JobStatusResponse::from(&Job::default())))
}

fn completed_parts(job: &Job) -> ApiResult<(&crate::models::RowQueue, &crate::models::SortedResult)> {
    if job.state() != JobState::Complete {
        return Err(ApiError::Conflict(format!(
            "results are available once the job is COMPLETE (currently {:?})",
            job.state()
        )));
    }

    match (job.queue.as_ref(), job.result.as_ref()) {
        (Some(queue), Some(result)) => Ok((queue, result)),
        _ => Err(ApiError::Internal(
            "completed job is missing its sorted result".to_string(),
        )),
    }
}

/// Build job routes, gated by the password session
pub fn job_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/job/target", post(set_target))
        .route(
            "/job/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/job/tick", post(tick_job))
        .route("/job/status", get(job_status))
        .route("/job/results", get(job_results))
        .route("/job/export", get(export_results))
        .route("/job/reset", post(reset_job))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
