use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::indicators::error::{IndicatorError, Result};

/// Cell markers treated as missing when inferring column types.
pub const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "NULL", "null"];

/// Values held by a single column. Every column in a [`Table`] has the same
/// length; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values")]
pub enum ColumnData {
    /// Floating point values.
    Numeric(Vec<Option<f64>>),
    /// Free text values such as administrative unit names.
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Returns the numeric values when the column holds numbers.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }

    /// Returns the cell at `row` rendered as text; missing cells are empty.
    pub fn cell_to_string(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Numeric(values) => values
                .get(row)
                .copied()
                .flatten()
                .map(|value| value.to_string())
                .unwrap_or_default(),
            ColumnData::Text(values) => values
                .get(row)
                .cloned()
                .flatten()
                .unwrap_or_default(),
        }
    }

    /// Keeps the first `n` cells.
    fn truncated(&self, n: usize) -> Column {
        let data = match &self.data {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(values.iter().take(n).copied().collect())
            }
            ColumnData::Text(values) => ColumnData::Text(values.iter().take(n).cloned().collect()),
        };
        Column {
            name: self.name.clone(),
            data,
        }
    }
}

/// Column-oriented in-memory table with unique column names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table, validating that names are unique and lengths agree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(IndicatorError::InvalidDataset(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if column.len() != row_count {
                return Err(IndicatorError::InvalidDataset(format!(
                    "column '{}' has {} rows, expected {row_count}",
                    column.name,
                    column.len()
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Builds a typed table from raw string cells. A column is numeric when
    /// every non-missing cell parses as a float; otherwise it is text.
    /// Repeated headers are renamed `X.1`, `X.2`, ... in order of appearance.
    pub fn from_string_rows(headers: Vec<String>, rows: &[Vec<String>]) -> Result<Self> {
        let headers = dedupe_headers(headers);
        let mut columns = Vec::with_capacity(headers.len());
        for (col_idx, header) in headers.into_iter().enumerate() {
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(col_idx).map(String::as_str).filter(|c| !is_missing(c)))
                .collect();
            columns.push(infer_column(header, &cells));
        }
        Self::from_columns(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Numeric values of the named column, if it exists and is numeric.
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).and_then(Column::as_numeric)
    }

    /// Returns a copy holding the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.truncated(n)).collect(),
            row_count: self.row_count.min(n),
        }
    }

    /// Row-major string rendering, used by the exporters.
    pub fn string_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count)
            .map(|row| self.columns.iter().map(|c| c.cell_to_string(row)).collect())
            .collect()
    }
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().cloned().collect();
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }
            let renamed = (1..)
                .map(|n| format!("{header}.{n}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            taken.insert(renamed.clone());
            renamed
        })
        .collect()
}

fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

fn infer_column(name: String, cells: &[Option<&str>]) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            Some(value) => value.trim().parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(values) => Column::numeric(name, values),
        None => Column::text(
            name,
            cells.iter().map(|cell| cell.map(str::to_string)).collect(),
        ),
    }
}
