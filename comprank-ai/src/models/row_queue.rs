//! Row queue built from an uploaded table
//!
//! The expected upload is an export with a fixed layout: six metadata rows,
//! a header row, the data rows, and two summary rows at the bottom. The
//! offsets are part of that format and are intentionally not configurable.

use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Column holding the text that gets rated
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Column dropped from the queue when present
pub const DEAL_ID_COLUMN: &str = "Deal ID";

/// Result column inserted right after `Description`
pub const RANKING_COLUMN: &str = "Similarity Ranking";

/// Metadata rows preceding the header row
pub const HEADER_SKIP_ROWS: usize = 6;

/// Summary rows trailing the data rows
pub const FOOTER_ROWS: usize = 2;

/// Undecoded upload: every physical row, header and footer included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

/// One source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Positional index among the data rows (0-based)
    pub index: usize,

    /// Cell values, aligned with [`RowQueue::columns`]
    pub values: Vec<String>,

    /// Similarity score 1-10, None until rated
    pub score: Option<u8>,
}

impl Row {
    /// Score as exported: 0 stands for "unscored"
    pub fn ranking(&self) -> u8 {
        self.score.unwrap_or(0)
    }
}

/// Ordered rows awaiting rating
///
/// Length and row order are fixed at construction; only scores change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQueue {
    columns: Vec<String>,
    description_column: usize,
    rows: Vec<Row>,
}

impl RowQueue {
    /// Build the queue from a raw upload
    ///
    /// Fails with a validation error when there is no header row or no
    /// `Description` column. Nothing is built in that case.
    pub fn build(table: &RawTable) -> Result<Self, JobError> {
        let mut body = table.rows.iter().skip(HEADER_SKIP_ROWS);

        let header = body.next().ok_or_else(|| {
            JobError::Validation(format!(
                "upload has {} rows, expected a header row after {} metadata rows",
                table.rows.len(),
                HEADER_SKIP_ROWS
            ))
        })?;

        let data: Vec<&Vec<String>> = body.collect();
        let data_len = data.len().saturating_sub(FOOTER_ROWS);

        let deal_id = header.iter().position(|c| c == DEAL_ID_COLUMN);
        let keep: Vec<usize> = (0..header.len()).filter(|&i| Some(i) != deal_id).collect();

        let columns: Vec<String> = keep.iter().map(|&i| header[i].clone()).collect();
        let description_column = columns
            .iter()
            .position(|c| c == DESCRIPTION_COLUMN)
            .ok_or_else(|| JobError::Validation("missing Description column".to_string()))?;

        let rows = data
            .into_iter()
            .take(data_len)
            .enumerate()
            .map(|(index, raw)| Row {
                index,
                values: keep
                    .iter()
                    .map(|&i| raw.get(i).cloned().unwrap_or_default())
                    .collect(),
                score: None,
            })
            .collect();

        Ok(Self {
            columns,
            description_column,
            rows,
        })
    }

    /// Source columns, `Deal ID` removed, without the ranking column
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Description text of the row at `index`
    pub fn description(&self, index: usize) -> Option<&str> {
        self.rows
            .get(index)
            .and_then(|row| row.values.get(self.description_column))
            .map(String::as_str)
    }

    /// Record the score of the row at `index`
    pub fn set_score(&mut self, index: usize, score: u8) -> Result<(), JobError> {
        let row = self.rows.get_mut(index).ok_or_else(|| {
            JobError::Unrecoverable(format!("row {} is outside the queue", index))
        })?;
        row.score = Some(score);
        Ok(())
    }

    /// Output header: source columns with `Similarity Ranking` after `Description`
    pub fn output_header(&self) -> Vec<String> {
        let mut header = self.columns.clone();
        header.insert(self.description_column + 1, RANKING_COLUMN.to_string());
        header
    }

    /// Output cells of `row`, aligned with [`RowQueue::output_header`]
    pub fn output_record(&self, row: &Row) -> Vec<String> {
        let mut record = row.values.clone();
        let at = (self.description_column + 1).min(record.len());
        record.insert(at, row.ranking().to_string());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn upload(header: &[&str], data: &[&[&str]]) -> RawTable {
        let mut rows: Vec<Vec<String>> = (0..HEADER_SKIP_ROWS)
            .map(|i| cells(&[&format!("meta {}", i)]))
            .collect();
        rows.push(cells(header));
        rows.extend(data.iter().map(|r| cells(r)));
        rows.push(cells(&["Total", ""]));
        rows.push(cells(&["Generated by export", ""]));
        RawTable::new(rows)
    }

    #[test]
    fn test_trims_header_and_footer() {
        let table = upload(
            &["Company", "Description"],
            &[&["Acme", "Widgets"], &["Globex", "Gadgets"], &["Initech", "Software"]],
        );

        let queue = RowQueue::build(&table).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.description(0), Some("Widgets"));
        assert_eq!(queue.description(2), Some("Software"));
        assert!(queue.rows().iter().all(|r| r.score.is_none()));
        assert_eq!(
            queue.rows().iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_missing_description_column_rejected() {
        let table = upload(&["Company", "Summary"], &[&["Acme", "Widgets"]]);

        let err = RowQueue::build(&table).unwrap_err();
        assert_eq!(err, JobError::Validation("missing Description column".to_string()));
    }

    #[test]
    fn test_upload_without_header_rejected() {
        let table = RawTable::new(vec![cells(&["meta"]); 4]);
        assert!(matches!(RowQueue::build(&table), Err(JobError::Validation(_))));
    }

    #[test]
    fn test_deal_id_dropped_and_ranking_inserted() {
        let table = upload(
            &["Deal ID", "Company", "Description", "Sector"],
            &[&["17", "Acme", "Widgets", "Industrial"]],
        );

        let mut queue = RowQueue::build(&table).unwrap();
        assert_eq!(queue.columns(), &cells(&["Company", "Description", "Sector"])[..]);
        assert_eq!(
            queue.output_header(),
            cells(&["Company", "Description", "Similarity Ranking", "Sector"])
        );

        let row = queue.rows()[0].clone();
        assert_eq!(
            queue.output_record(&row),
            cells(&["Acme", "Widgets", "0", "Industrial"])
        );

        queue.set_score(0, 4).unwrap();
        let row = queue.rows()[0].clone();
        assert_eq!(queue.output_record(&row), cells(&["Acme", "Widgets", "4", "Industrial"]));
    }

    #[test]
    fn test_ragged_rows_padded() {
        let table = upload(&["Company", "Description", "Sector"], &[&["Acme"]]);

        let queue = RowQueue::build(&table).unwrap();
        assert_eq!(queue.rows()[0].values, cells(&["Acme", "", ""]));
        assert_eq!(queue.description(0), Some(""));
    }

    #[test]
    fn test_footer_only_yields_empty_queue() {
        let table = upload(&["Description"], &[]);
        let queue = RowQueue::build(&table).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_set_score_out_of_range() {
        let table = upload(&["Description"], &[&["Widgets"]]);
        let mut queue = RowQueue::build(&table).unwrap();
        assert!(matches!(queue.set_score(5, 3), Err(JobError::Unrecoverable(_))));
    }
}
