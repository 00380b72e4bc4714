//! Sorted rating output

use serde::{Deserialize, Serialize};

use crate::models::Row;

/// Rows ordered by ascending score, ties in original row order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedResult {
    /// Output header, `Similarity Ranking` included
    pub columns: Vec<String>,

    /// Sorted rows
    pub rows: Vec<Row>,

    /// Rows scoring 3 or lower
    pub strong_matches: usize,
}

impl SortedResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
