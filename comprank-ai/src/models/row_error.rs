//! Row-level error reports
//!
//! Rows never abort the batch. A row that fell back to a default score, or
//! the failure that halted the job, is recorded here so the host can render
//! it next to the progress display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorSeverity {
    /// Row scored with a fallback value, batch continues
    Warning,
    /// Job halted in FAILED
    Critical,
}

/// Error attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowErrorReport {
    /// Positional index of the row in the uploaded table, if row-specific
    pub row_index: Option<usize>,

    /// Error code (e.g., "RATING_FALLBACK", "UNRECOVERABLE")
    pub error_code: String,

    /// Human-readable error message
    pub error_message: String,

    /// Error severity
    pub severity: ErrorSeverity,

    /// When the error occurred
    pub occurred_at: DateTime<Utc>,
}

impl RowErrorReport {
    /// Create new warning for a row
    pub fn warning(row_index: usize, error_code: &str, error_message: String) -> Self {
        Self {
            row_index: Some(row_index),
            error_code: error_code.to_string(),
            error_message,
            severity: ErrorSeverity::Warning,
            occurred_at: Utc::now(),
        }
    }

    /// Create new critical error
    pub fn critical(row_index: Option<usize>, error_code: &str, error_message: String) -> Self {
        Self {
            row_index,
            error_code: error_code.to_string(),
            error_message,
            severity: ErrorSeverity::Critical,
            occurred_at: Utc::now(),
        }
    }
}
