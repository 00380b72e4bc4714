//! Test Helper Utilities
//!
//! Shared utilities for testing comprank-ai
#![allow(dead_code)]

pub mod app;
pub mod backends;

pub use app::{
    body_json, body_text, create_test_app, create_test_db, get, post_bytes, post_csv, post_empty,
    post_json, sample_table, sample_upload, sample_workbook, send, test_rater,
};
pub use backends::{candidate_of, AnswerBackend, FlakyBackend};
