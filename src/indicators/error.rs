use std::path::Path;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, normalizes, joins, or exports indicator data.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the CSV parser cannot produce a table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a dataset, boundary file, or model artifact does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// Raised when the province grouping column is absent from the input.
    #[error("missing key column '{0}'")]
    MissingKeyColumn(String),

    /// Raised when a page-level operation needs columns the dataset lacks.
    #[error("dataset lacks columns required for {purpose}: {}", .columns.join(", "))]
    MissingColumns {
        purpose: String,
        columns: Vec<String>,
    },

    /// Raised on a timeout, transport failure, or non-success HTTP status.
    #[error("failed to fetch {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    /// Raised when a parsed table violates the table invariants.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Raised when boundary data is not a GeoJSON feature collection.
    #[error("invalid boundary data: {0}")]
    InvalidBoundaries(String),

    /// Raised when a model or scaler artifact has an inconsistent shape.
    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    /// Raised when a prediction request carries the wrong number of features.
    #[error("expected {expected} features but received {actual}")]
    FeatureShape { expected: usize, actual: usize },

    /// Raised when a column mapping is requested by an unknown name.
    #[error("unknown column mapping '{0}'")]
    UnknownMapping(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl IndicatorError {
    pub(crate) fn missing_source(path: &Path) -> Self {
        IndicatorError::SourceNotFound(path.display().to_string())
    }
}
