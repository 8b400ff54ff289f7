use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::table::Table;

/// Reads the first worksheet of an `.xlsx` workbook. The first row holds the
/// headers; the remaining rows hold one administrative unit each.
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(IndicatorError::missing_source(path));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IndicatorError::InvalidDataset("workbook has no worksheets".into()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row.iter().map(|cell| cell_to_string(Some(cell))).collect(),
        None => Vec::new(),
    };
    let body: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
        .collect();

    debug!(
        path = %path.display(),
        rows = body.len(),
        columns = headers.len(),
        "read workbook dataset"
    );
    Table::from_string_rows(headers, &body)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
