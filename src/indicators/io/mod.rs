pub mod csv_read;
pub mod csv_write;
pub mod excel_read;
pub mod excel_write;

use std::path::Path;

use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::table::Table;

/// Reads a dataset, choosing the parser from the file extension: `.xlsx`
/// workbooks go through the Excel reader, everything else is parsed as CSV.
pub fn read_dataset(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(IndicatorError::missing_source(path));
    }
    if is_workbook(path) {
        excel_read::read_table(path)
    } else {
        csv_read::read_table(path)
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}
