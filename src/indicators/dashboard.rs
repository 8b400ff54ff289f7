use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crate::indicators::boundary::{
    self, BoundarySource, FeatureCollection, annotate_features, join_provinces,
};
use crate::indicators::cache::{MemoCache, SourceId};
use crate::indicators::config::Settings;
use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::explore::{self, CorrelationMatrix, ScatterSeries};
use crate::indicators::io::excel_write::{self, SheetTable};
use crate::indicators::io::{self, csv_write};
use crate::indicators::mapping::{POVERTY_RATE, PROVINCE, Substitution};
use crate::indicators::normalize::{NormalizedDataset, normalize};
use crate::indicators::predict::Predictor;
use crate::indicators::table::{ColumnData, Table};

/// Columns the province map cannot be built without.
pub const MAP_COLUMNS: &[&str] = &[PROVINCE, POVERTY_RATE];

pub const RECORDS_SHEET: &str = "Records";
pub const PROVINCES_SHEET: &str = "Provinces";

/// Province summaries joined onto boundary features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceMap {
    /// Indicator shaded on the map.
    pub metric: String,
    /// Boundary features with indicator properties attached.
    pub features: FeatureCollection,
    pub unmatched_features: Vec<String>,
    pub unmatched_provinces: Vec<String>,
}

/// Data behind the exploration page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationReport {
    pub mapping: String,
    pub substitutions: Vec<Substitution>,
    pub preview: Vec<Map<String, Value>>,
    pub correlations: CorrelationMatrix,
    pub scatter: Vec<ScatterSeries>,
}

/// Page-level operations over cached datasets and boundary data.
#[derive(Debug)]
pub struct Dashboard {
    settings: Settings,
    datasets: MemoCache<SourceId, NormalizedDataset>,
    boundaries: MemoCache<SourceId, FeatureCollection>,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            datasets: MemoCache::new(),
            boundaries: MemoCache::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads and normalizes the dataset at `path`, reusing the cached result
    /// for a path that was already loaded.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load_dataset(&self, path: &Path) -> Result<Arc<NormalizedDataset>> {
        self.datasets.get_or_try_insert_with(&SourceId::path(path), || -> Result<_> {
            let raw = io::read_dataset(path)?;
            let dataset = normalize(&raw, &self.settings.mapping)?;
            info!(
                rows = dataset.records.row_count(),
                provinces = dataset.provinces.len(),
                "dataset normalized"
            );
            Ok(dataset)
        })
    }

    /// The configured dataset.
    pub fn dataset(&self) -> Result<Arc<NormalizedDataset>> {
        self.load_dataset(&self.settings.data_path)
    }

    /// Loads boundary data through the cache.
    pub fn load_boundaries(&self, source: &BoundarySource) -> Result<Arc<FeatureCollection>> {
        self.boundaries.get_or_try_insert_with(&source.id(), || {
            boundary::load_boundaries(source, self.settings.fetch_timeout)
        })
    }

    /// Joins the configured dataset onto the configured boundaries.
    #[instrument(level = "info", skip_all)]
    pub fn province_map(&self) -> Result<ProvinceMap> {
        let dataset = self.dataset()?;
        let summary = dataset.summary_table()?;
        require_columns(&summary, MAP_COLUMNS, "the province map")?;

        let source = BoundarySource::from_location(&self.settings.boundaries);
        let collection = self.load_boundaries(&source)?;
        let property = self.settings.boundary_name_property.as_str();

        let join = join_provinces(&collection, &dataset.provinces, property);
        debug!(matched = join.matched.len(), "provinces joined to boundaries");
        Ok(ProvinceMap {
            metric: POVERTY_RATE.to_string(),
            features: annotate_features(&collection, &join),
            unmatched_features: join.unmatched_features,
            unmatched_provinces: join.unmatched_provinces,
        })
    }

    /// Preview rows, correlations and scatter series of the configured dataset.
    #[instrument(level = "info", skip_all)]
    pub fn exploration(&self) -> Result<ExplorationReport> {
        let dataset = self.dataset()?;
        let records = &dataset.records;
        Ok(ExplorationReport {
            mapping: dataset.mapping.to_string(),
            substitutions: dataset.substitutions.clone(),
            preview: table_to_json_rows(&explore::preview(records, self.settings.preview_rows)),
            correlations: explore::correlation_matrix(records),
            scatter: explore::scatter_series(records, POVERTY_RATE),
        })
    }

    /// Loads the configured prediction artifacts.
    pub fn predictor(&self) -> Result<Predictor> {
        Predictor::load(&self.settings.scaler_path, &self.settings.model_path)
    }

    /// Forgets every cached dataset and boundary collection.
    pub fn clear_cache(&self) {
        self.datasets.clear();
        self.boundaries.clear();
    }

    pub fn cached_datasets(&self) -> usize {
        self.datasets.len()
    }
}

/// Fails with [`IndicatorError::MissingColumns`] unless every column exists.
pub fn require_columns(table: &Table, columns: &[&str], purpose: &str) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !table.has_column(column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IndicatorError::MissingColumns {
            purpose: purpose.to_string(),
            columns: missing,
        })
    }
}

/// Writes records and province summaries to a two-sheet workbook.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_workbook(dataset: &NormalizedDataset, output: &Path) -> Result<()> {
    let summary = dataset.summary_table()?;
    excel_write::write_workbook(
        output,
        &[
            SheetTable {
                sheet_name: RECORDS_SHEET,
                table: &dataset.records,
            },
            SheetTable {
                sheet_name: PROVINCES_SHEET,
                table: &summary,
            },
        ],
    )
}

/// Writes records and province summaries to two CSV files.
#[instrument(
    level = "info",
    skip_all,
    fields(records = %records.display(), provinces = %provinces.display())
)]
pub fn export_csv(dataset: &NormalizedDataset, records: &Path, provinces: &Path) -> Result<()> {
    csv_write::write_table(records, &dataset.records)?;
    csv_write::write_table(provinces, &dataset.summary_table()?)
}

/// Serializes `value` as pretty JSON to `output`.
pub fn write_json<T: Serialize>(value: &T, output: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    fs::write(output, json_string)?;
    Ok(())
}

/// Row-oriented JSON objects keyed by column name.
pub fn table_to_json_rows(table: &Table) -> Vec<Map<String, Value>> {
    (0..table.row_count())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|column| {
                    let value = match &column.data {
                        ColumnData::Numeric(values) => json!(values[row]),
                        ColumnData::Text(values) => json!(values[row]),
                    };
                    (column.name.clone(), value)
                })
                .collect()
        })
        .collect()
}
