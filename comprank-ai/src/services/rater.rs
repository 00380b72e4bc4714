//! Similarity rater
//!
//! Scores one candidate description against the target on a 1-10 scale,
//! 1 meaning a very similar business model. The rater never fails: an empty
//! candidate gets the neutral score, an unparseable answer or an exhausted
//! retry gets the "unrelated" fallback.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::services::chat_client::{ChatBackend, ChatMessage, ChatRequest};

/// Score for an empty candidate, assigned without calling out
pub const NEUTRAL_SCORE: u8 = 5;

/// Score when the answer has no rating or the service stays down
pub const FALLBACK_SCORE: u8 = 10;

/// Response token budget; the model is asked for a bare integer
pub const MAX_RESPONSE_TOKENS: u32 = 5;

/// Default pause before the single retry
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub const DEFAULT_MODEL: &str = "deepseek-chat";

const SYSTEM_PERSONA: &str = "You are an experienced investment analyst.";

/// Outcome of one rating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    /// Score in 1..=10
    pub score: u8,
    /// Set when the score is the fallback after two failed calls
    pub error: Option<String>,
}

impl Rating {
    pub fn scored(score: u8) -> Self {
        Self { score, error: None }
    }

    pub fn fallback(error: String) -> Self {
        Self {
            score: FALLBACK_SCORE,
            error: Some(error),
        }
    }
}

/// Rubric prompt embedding target and candidate
pub fn build_prompt(target: &str, candidate: &str) -> String {
    format!(
        "Rate the business-model similarity between the text below and the target company on a 1-10 scale:\n\
         1-2 = Very similar business models (strong comparables)\n\
         3-4 = Similar with some differences\n\
         5-6 = Moderately similar\n\
         7-8 = Different business models\n\
         9-10 = Completely unrelated\n\
         \n\
         Respond with only the integer.\n\
         \n\
         Target:\n\
         {target}\n\
         \n\
         Candidate:\n\
         {candidate}"
    )
}

/// First standalone `10` or `1`-`9` in the model's answer
pub fn parse_score(response: &str) -> Option<u8> {
    static SCORE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = SCORE
        .get_or_init(|| Regex::new(r"\b(10|[1-9])\b").ok())
        .as_ref()?;

    re.captures(response)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Rates candidates through a chat backend with one retry
pub struct SimilarityRater {
    backend: Arc<dyn ChatBackend>,
    model: String,
    retry_backoff: Duration,
}

impl SimilarityRater {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Request sent for one candidate
    pub fn request_for(&self, candidate: &str, target: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PERSONA),
                ChatMessage::user(build_prompt(target, candidate)),
            ],
            temperature: 0.0,
            max_tokens: MAX_RESPONSE_TOKENS,
        }
    }

    /// Rate `candidate` against `target`
    ///
    /// Two attempts at most, `retry_backoff` apart. When both fail the
    /// returned rating carries the fallback score and the last error.
    pub async fn rate(&self, candidate: &str, target: &str) -> Rating {
        if candidate.is_empty() {
            return Rating::scored(NEUTRAL_SCORE);
        }

        let request = self.request_for(candidate, target);

        let first_error = match self.backend.complete(&request).await {
            Ok(answer) => return Rating::scored(score_answer(&answer)),
            Err(e) => e,
        };

        tracing::warn!(
            error = %first_error,
            backoff_ms = self.retry_backoff.as_millis() as u64,
            "Rating request failed, retrying once"
        );
        tokio::time::sleep(self.retry_backoff).await;

        match self.backend.complete(&request).await {
            Ok(answer) => Rating::scored(score_answer(&answer)),
            Err(e) => {
                tracing::error!(error = %e, "Rating request failed twice, using fallback score");
                Rating::fallback(format!("API error: {}", e))
            }
        }
    }
}

fn score_answer(answer: &str) -> u8 {
    match parse_score(answer) {
        Some(score) => score,
        None => {
            tracing::warn!(answer = %answer, "No rating in model answer, using fallback score");
            FALLBACK_SCORE
        }
    }
}

impl std::fmt::Debug for SimilarityRater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityRater")
            .field("model", &self.model)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}
