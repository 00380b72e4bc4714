//! Result materializer
//!
//! Pure: the same queue always yields the same sorted result.

use crate::models::{Row, RowQueue, SortedResult};

/// Highest score that still counts as a strong comparable
pub const STRONG_MATCH_MAX: u8 = 3;

/// Sort rows by ascending score, ties kept in original row order
pub fn materialize(queue: &RowQueue) -> SortedResult {
    let mut rows = queue.rows().to_vec();
    // Vec::sort_by_key is stable; rows arrive in index order
    rows.sort_by_key(|row| row.ranking());

    let strong_matches = count_strong_matches(&rows);

    SortedResult {
        columns: queue.output_header(),
        rows,
        strong_matches,
    }
}

/// Rated rows scoring at most [`STRONG_MATCH_MAX`]
pub fn count_strong_matches(rows: &[Row]) -> usize {
    rows.iter()
        .filter(|row| matches!(row.score, Some(score) if score <= STRONG_MATCH_MAX))
        .count()
}
