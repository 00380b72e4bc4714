//! CSV export of the sorted result

use crate::error::JobError;
use crate::models::{RowQueue, SortedResult};

/// Download file name
pub const EXPORT_FILENAME: &str = "similarity_analysis.csv";

/// Download MIME type
pub const EXPORT_MIME: &str = "text/csv";

/// Serialize `result` as CSV: header row, then one record per row
///
/// `queue` supplies the column layout the rows were built with.
pub fn to_csv(queue: &RowQueue, result: &SortedResult) -> Result<String, JobError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(&result.columns)
        .map_err(|e| JobError::Unrecoverable(format!("CSV export failed: {}", e)))?;

    for row in &result.rows {
        writer
            .write_record(queue.output_record(row))
            .map_err(|e| JobError::Unrecoverable(format!("CSV export failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| JobError::Unrecoverable(format!("CSV export failed: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| JobError::Unrecoverable(format!("CSV export produced invalid UTF-8: {}", e)))
}
