use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::mapping::{ColumnMapping, PER_CAPITA_EXPENDITURE, PROVINCE, Substitution};
use crate::indicators::table::{Column, ColumnData, Table};

/// Per-capita expenditure is exported per year; canonical values are monthly.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Canonical form of a province name used for grouping and for joining
/// against boundary polygons: surrounding whitespace removed, uppercased.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Province-level means of every numeric canonical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceSummary {
    /// Normalized province name.
    pub province: String,
    /// Number of administrative-unit rows averaged into this summary.
    pub unit_count: usize,
    /// Canonical column → mean. `None` when the group has no values.
    pub indicators: BTreeMap<String, Option<f64>>,
}

impl ProvinceSummary {
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied().flatten()
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    /// Name of the mapping configuration that produced the records.
    pub mapping: &'static str,
    /// Cleaned record-level table with canonical column names.
    pub records: Table,
    /// One summary per distinct province, sorted by province name.
    pub provinces: Vec<ProvinceSummary>,
    /// Semantic substitutions applied by the mapping.
    pub substitutions: Vec<Substitution>,
}

impl NormalizedDataset {
    /// Finds a summary by province name in any casing or spacing.
    pub fn province(&self, name: &str) -> Option<&ProvinceSummary> {
        let key = normalize_key(name);
        self.provinces.iter().find(|summary| summary.province == key)
    }

    /// Renders the province summaries as a table: the province column first,
    /// then the numeric canonical columns in record order.
    pub fn summary_table(&self) -> Result<Table> {
        let mut columns = vec![Column::text(
            PROVINCE,
            self.provinces
                .iter()
                .map(|summary| Some(summary.province.clone()))
                .collect(),
        )];
        for name in numeric_columns(&self.records) {
            columns.push(Column::numeric(
                name,
                self.provinces
                    .iter()
                    .map(|summary| summary.indicator(name))
                    .collect(),
            ));
        }
        Table::from_columns(columns)
    }
}

/// Cleans a raw table and aggregates it to province level.
///
/// Columns outside the mapping are dropped and mapping entries without a
/// source column are skipped. The only failure is a missing province column.
pub fn normalize(raw: &Table, mapping: &ColumnMapping) -> Result<NormalizedDataset> {
    let (mut records, substitutions) = select_columns(raw, mapping)?;
    if !records.has_column(mapping.key_column()) {
        return Err(IndicatorError::MissingKeyColumn(
            mapping.key_column().to_string(),
        ));
    }

    correct_units(&mut records);
    normalize_keys(&mut records, mapping.key_column());
    let provinces = aggregate_by_province(&records, mapping.key_column())?;

    debug!(
        mapping = mapping.name(),
        rows = records.row_count(),
        columns = records.columns().len(),
        provinces = provinces.len(),
        "normalized dataset"
    );

    Ok(NormalizedDataset {
        mapping: mapping.name(),
        records,
        provinces,
        substitutions,
    })
}

/// Copies the mapped columns present in `raw` under their canonical names.
pub fn select_columns(raw: &Table, mapping: &ColumnMapping) -> Result<(Table, Vec<Substitution>)> {
    let headers = raw.column_names();
    let mut columns = Vec::new();
    let mut substitutions = Vec::new();

    for rule in mapping.resolve(&headers) {
        let Some(source) = raw.column(rule.source) else {
            continue;
        };
        if let Some(note) = rule.substitution {
            warn!(
                source = rule.source,
                canonical = rule.canonical,
                note,
                "column mapping substitutes one indicator for another"
            );
            substitutions.push(Substitution {
                source: rule.source.to_string(),
                canonical: rule.canonical.to_string(),
                note: note.to_string(),
            });
        }
        columns.push(Column {
            name: rule.canonical.to_string(),
            data: source.data.clone(),
        });
    }

    Ok((Table::from_columns(columns)?, substitutions))
}

/// Converts annual per-capita expenditure into monthly values.
pub fn correct_units(records: &mut Table) {
    if let Some(column) = records.column_mut(PER_CAPITA_EXPENDITURE) {
        if let ColumnData::Numeric(values) = &mut column.data {
            for value in values.iter_mut().flatten() {
                *value /= MONTHS_PER_YEAR;
            }
        }
    }
}

/// Rewrites the province column with [`normalize_key`]. Numeric province
/// codes are rendered as text first.
pub fn normalize_keys(records: &mut Table, key: &str) {
    let Some(column) = records.column_mut(key) else {
        return;
    };
    let normalized = match &column.data {
        ColumnData::Text(values) => values
            .iter()
            .map(|value| value.as_deref().map(normalize_key))
            .collect(),
        ColumnData::Numeric(values) => values
            .iter()
            .map(|value| value.map(|v| normalize_key(&v.to_string())))
            .collect(),
    };
    column.data = ColumnData::Text(normalized);
}

/// Groups rows by the (already normalized) key column and averages every
/// numeric column, skipping missing cells. Rows without a key are dropped.
pub fn aggregate_by_province(records: &Table, key: &str) -> Result<Vec<ProvinceSummary>> {
    let key_column = records
        .column(key)
        .ok_or_else(|| IndicatorError::MissingKeyColumn(key.to_string()))?;

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..records.row_count() {
        let name = key_column.cell_to_string(row);
        if name.is_empty() {
            continue;
        }
        groups.entry(name).or_default().push(row);
    }

    let numeric: Vec<(&str, &[Option<f64>])> = records
        .columns()
        .iter()
        .filter(|column| column.name != key)
        .filter_map(|column| column.as_numeric().map(|v| (column.name.as_str(), v)))
        .collect();

    Ok(groups
        .into_iter()
        .map(|(province, rows)| {
            let indicators = numeric
                .iter()
                .map(|(name, values)| (name.to_string(), mean(rows.iter().map(|r| values[*r]))))
                .collect();
            ProvinceSummary {
                province,
                unit_count: rows.len(),
                indicators,
            }
        })
        .collect())
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .filter(|value| !value.is_nan())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn numeric_columns(records: &Table) -> Vec<&str> {
    records
        .columns()
        .iter()
        .filter(|column| column.is_numeric() && column.name != PROVINCE)
        .map(|column| column.name.as_str())
        .collect()
}
