use std::path::PathBuf;
use std::time::Duration;

use crate::indicators::boundary::DEFAULT_NAME_PROPERTY;
use crate::indicators::mapping::ColumnMapping;

pub const DATA_PATH: &str = "data/df_cleaned.csv";
pub const GEOJSON_PATH: &str = "data/prov 34.geojson";
pub const SCALER_PATH: &str = "models/scaler.json";
pub const MODEL_PATH: &str = "models/model.json";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const PREVIEW_ROWS: usize = 5;

/// Locations and knobs used by the dashboard. Defaults come from the
/// constants above; the command line overrides individual fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    /// Boundary file path or `http(s)://` URL.
    pub boundaries: String,
    pub boundary_name_property: String,
    pub scaler_path: PathBuf,
    pub model_path: PathBuf,
    pub mapping: ColumnMapping,
    pub fetch_timeout: Duration,
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DATA_PATH),
            boundaries: GEOJSON_PATH.to_string(),
            boundary_name_property: DEFAULT_NAME_PROPERTY.to_string(),
            scaler_path: PathBuf::from(SCALER_PATH),
            model_path: PathBuf::from(MODEL_PATH),
            mapping: ColumnMapping::STANDARD,
            fetch_timeout: FETCH_TIMEOUT,
            preview_rows: PREVIEW_ROWS,
        }
    }
}
