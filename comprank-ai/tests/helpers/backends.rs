//! Chat backends that never leave the process

use async_trait::async_trait;
use comprank_ai::services::{ChatBackend, ChatRequest, RaterError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Candidate text embedded in a rating request
pub fn candidate_of(request: &ChatRequest) -> String {
    request
        .messages
        .last()
        .and_then(|m| m.content.rsplit("Candidate:\n").next())
        .unwrap_or_default()
        .to_string()
}

/// Answers from a fixed candidate → answer table
///
/// Candidates missing from the table get "5".
pub struct AnswerBackend {
    answers: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl AnswerBackend {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            answers: pairs
                .iter()
                .map(|(candidate, answer)| (candidate.to_string(), answer.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Candidates in the order they were rated
    pub fn candidates(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for AnswerBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String, RaterError> {
        let candidate = candidate_of(request);
        let answer = self
            .answers
            .get(&candidate)
            .cloned()
            .unwrap_or_else(|| "5".to_string());
        self.calls.lock().unwrap().push(candidate);
        Ok(answer)
    }
}

/// Fails the first `failures` calls, then answers `answer`
pub struct FlakyBackend {
    failures_left: AtomicUsize,
    answer: String,
    calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(failures: usize, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(failures),
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Backend whose service never comes back
    pub fn always_down() -> Arc<Self> {
        Self::new(usize::MAX, "")
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FlakyBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, RaterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            Err(RaterError::Api(503, "service unavailable".to_string()))
        } else {
            Ok(self.answer.clone())
        }
    }
}
