use std::path::Path;

use csv::Writer;

use crate::indicators::error::Result;
use crate::indicators::table::Table;

/// Writes the table as CSV with a header row. Missing cells are left empty.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in table.string_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
