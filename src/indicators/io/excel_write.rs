use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use crate::indicators::error::Result;
use crate::indicators::table::{ColumnData, Table};

/// A table destined for its own worksheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetTable<'a> {
    pub sheet_name: &'a str,
    pub table: &'a Table,
}

/// Writes each table to its own worksheet. Numeric columns are written as
/// numbers so spreadsheet formulas keep working on the export.
pub fn write_workbook(path: &Path, sheets: &[SheetTable<'_>]) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(sheet.sheet_name)?;
        write_sheet(worksheet, sheet.table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = col_idx as u16;
        worksheet.write_string(0, col, &column.name)?;

        match &column.data {
            ColumnData::Numeric(values) => {
                for (row_idx, value) in values.iter().enumerate() {
                    if let Some(value) = value {
                        worksheet.write_number((row_idx + 1) as u32, col, *value)?;
                    }
                }
            }
            ColumnData::Text(values) => {
                for (row_idx, value) in values.iter().enumerate() {
                    if let Some(value) = value {
                        worksheet.write_string((row_idx + 1) as u32, col, value)?;
                    }
                }
            }
        }
    }

    // An Excel table needs at least one data row below its header.
    if table.columns().is_empty() || table.row_count() == 0 {
        return Ok(());
    }

    let mut excel_table = rust_xlsxwriter::Table::new();
    excel_table.set_autofilter(true);
    let col_end = (table.columns().len() as u16).saturating_sub(1);
    worksheet.add_table(0, 0, table.row_count() as u32, col_end, &excel_table)?;
    Ok(())
}
