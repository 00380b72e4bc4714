//! Upload decoding
//!
//! Reads an uploaded export into a [`RawTable`]. Two formats are accepted:
//! an Excel workbook (first sheet) and comma-separated text. Every physical
//! row is kept, blank ones and metadata and footer included; interpreting
//! them is the row queue's job. Rows may have different lengths.

use std::io::{Cursor, Read};

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use csv::ReaderBuilder;

use crate::error::JobError;
use crate::models::RawTable;

/// Leading bytes of a zip container, which every .xlsx is
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Stand-in for a blank physical line; `csv` would drop the line otherwise
const BLANK_LINE: &str = "\"\"";

/// Decode CSV text into raw rows
///
/// A UTF-8 byte order mark is stripped. Blank lines become empty rows so row
/// offsets match the physical line numbers of the file; trailing blank lines
/// are ignored.
pub fn read_table<R: Read>(mut input: R) -> Result<RawTable, JobError> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| JobError::Validation(format!("unreadable upload: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| JobError::Validation(format!("upload is not UTF-8 text: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let marked = mark_blank_lines(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(marked.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            JobError::Validation(format!("unreadable upload at row {}: {}", rows.len() + 1, e))
        })?;
        if record.len() == 1 && record[0].is_empty() {
            rows.push(Vec::new());
        } else {
            rows.push(record.iter().map(str::to_string).collect());
        }
    }

    Ok(RawTable::new(rows))
}

/// Replace blank lines outside quoted cells with [`BLANK_LINE`]
fn mark_blank_lines(text: &str) -> String {
    let body = text.trim_end_matches(|c| c == '\r' || c == '\n');
    let mut marked = String::with_capacity(body.len() + 1);
    if body.is_empty() {
        return marked;
    }

    let mut in_quotes = false;
    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() && !in_quotes {
            marked.push_str(BLANK_LINE);
        } else {
            marked.push_str(line);
        }
        marked.push('\n');

        // Escaped quotes come in pairs, so parity tracks open quoted cells
        if line.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }
    marked
}

/// Decode the first sheet of an .xlsx workbook into raw rows
///
/// Rows and columns before the sheet's first used cell are padded back in,
/// so row 0 of the table is always row 1 of the sheet.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<RawTable, JobError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| JobError::Validation(format!("unreadable workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| JobError::Validation("workbook has no sheets".to_string()))?
        .map_err(|e| JobError::Validation(format!("unreadable worksheet: {}", e)))?;

    let (first_row, first_col) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return Ok(RawTable::default()),
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); first_row];
    for cells in range.rows() {
        let mut row = vec![String::new(); first_col];
        row.extend(cells.iter().map(cell_text));
        rows.push(row);
    }

    Ok(RawTable::new(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode an in-memory upload, workbook or CSV
pub fn read_table_bytes(bytes: &[u8]) -> Result<RawTable, JobError> {
    if bytes.starts_with(ZIP_MAGIC) {
        read_workbook_bytes(bytes)
    } else {
        read_table(bytes)
    }
}
