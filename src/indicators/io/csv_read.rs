use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::table::Table;

/// Parses a CSV file with a header row into a typed [`Table`].
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(IndicatorError::missing_source(path));
    }
    let reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let table = collect_table(reader)?;
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.columns().len(),
        "read CSV dataset"
    );
    Ok(table)
}

/// Parses CSV data from any reader, e.g. an in-memory buffer.
pub fn read_table_from_reader<R: Read>(source: R) -> Result<Table> {
    let reader = ReaderBuilder::new().has_headers(true).from_reader(source);
    collect_table(reader)
}

fn collect_table<R: Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Table::from_string_rows(headers, &rows)
}
