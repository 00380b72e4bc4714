//! Services for comprank-ai
//!
//! The rating core: upload decoding, similarity rating, the step scheduler,
//! result materialization and CSV export.

pub mod chat_client;
pub mod export;
pub mod materializer;
pub mod rater;
pub mod scheduler;
pub mod table_reader;

pub use chat_client::{ChatBackend, ChatCompletionClient, ChatMessage, ChatRequest, RaterError};
pub use materializer::{materialize, STRONG_MATCH_MAX};
pub use rater::{Rating, SimilarityRater};
pub use scheduler::{apply_rating, step, tick, TickOutcome};
pub use table_reader::{read_table, read_table_bytes, read_workbook_bytes};
