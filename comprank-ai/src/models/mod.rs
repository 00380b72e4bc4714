//! Data models for comprank-ai
//!
//! - Job state machine and batch progress
//! - Row queue built from the upload
//! - Sorted result and row-level error reports

pub mod job;
pub mod row_error;
pub mod row_queue;
pub mod sorted_result;

pub use job::{BatchProgress, Job, JobState, StateTransition, TargetDescription};
pub use row_error::{ErrorSeverity, RowErrorReport};
pub use row_queue::{RawTable, Row, RowQueue};
pub use sorted_result::SortedResult;
