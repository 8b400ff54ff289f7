use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use poverty_indicators::config::Settings;
use poverty_indicators::dashboard::{
    Dashboard, export_csv, export_workbook, table_to_json_rows, write_json,
};
use poverty_indicators::mapping::ColumnMapping;
use poverty_indicators::{IndicatorError, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    let dashboard = Dashboard::new(cli.settings()?);
    match cli.command {
        Command::Normalize(args) => execute_normalize(&dashboard, args),
        Command::Map(args) => execute_map(&dashboard, args),
        Command::Explore(args) => execute_explore(&dashboard, args),
        Command::Predict(args) => execute_predict(&dashboard, args),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| IndicatorError::Logging(err.to_string()))
}

fn execute_normalize(dashboard: &Dashboard, args: NormalizeArgs) -> Result<()> {
    let dataset = dashboard.dataset()?;
    if !dataset.substitutions.is_empty() {
        warn!(
            mapping = dataset.mapping,
            count = dataset.substitutions.len(),
            "exported columns include substituted indicators"
        );
    }

    match args.format {
        ExportFormat::Xlsx => export_workbook(&dataset, &args.output),
        ExportFormat::Csv => {
            let provinces = args
                .provinces
                .unwrap_or_else(|| sibling_path(&args.output, "provinces"));
            export_csv(&dataset, &args.output, &provinces)
        }
        ExportFormat::Json => {
            let report = serde_json::json!({
                "mapping": dataset.mapping,
                "substitutions": dataset.substitutions,
                "records": table_to_json_rows(&dataset.records),
                "provinces": dataset.provinces,
            });
            write_json(&report, &args.output)
        }
    }
}

fn execute_map(dashboard: &Dashboard, args: MapArgs) -> Result<()> {
    let map = dashboard.province_map()?;
    info!(
        features = map.features.features.len(),
        unmatched_features = ?map.unmatched_features,
        unmatched_provinces = ?map.unmatched_provinces,
        "province map assembled"
    );
    write_json(&map.features, &args.output)
}

fn execute_explore(dashboard: &Dashboard, args: ExploreArgs) -> Result<()> {
    let report = dashboard.exploration()?;
    match &args.output {
        Some(path) => write_json(&report, path),
        None => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn execute_predict(dashboard: &Dashboard, args: PredictArgs) -> Result<()> {
    let predictor = dashboard.predictor()?;
    let value = if args.features.is_empty() {
        predictor.predict(&args.values)?
    } else {
        let named: BTreeMap<String, f64> = args.features.into_iter().collect();
        predictor.predict_named(&named)?
    };
    println!("{value}");
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{stem}_{suffix}.csv"))
}

fn parse_named_feature(raw: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid value for '{name}': {err}"))?;
    Ok((name.trim().to_string(), value))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Clean, aggregate and explore Indonesian poverty indicators."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Dataset to load (CSV or XLSX).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Column mapping configuration.
    #[arg(long, global = true, value_enum)]
    mapping: Option<MappingKind>,

    /// Turn on debug logging.
    #[arg(long, global = true)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        if let Some(data) = &self.data {
            settings.data_path = data.clone();
        }
        if let Some(kind) = self.mapping {
            settings.mapping = ColumnMapping::by_name(kind.config_name())?;
        }
        match &self.command {
            Command::Map(args) => {
                if let Some(boundaries) = &args.boundaries {
                    settings.boundaries = boundaries.clone();
                }
                if let Some(property) = &args.name_property {
                    settings.boundary_name_property = property.clone();
                }
                if let Some(seconds) = args.timeout_secs {
                    settings.fetch_timeout = Duration::from_secs(seconds);
                }
            }
            Command::Explore(args) => {
                if let Some(rows) = args.preview_rows {
                    settings.preview_rows = rows;
                }
            }
            Command::Predict(args) => {
                if let Some(path) = &args.scaler {
                    settings.scaler_path = path.clone();
                }
                if let Some(path) = &args.model {
                    settings.model_path = path.clone();
                }
            }
            Command::Normalize(_) => {}
        }
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Clean the dataset and export records and province summaries.
    Normalize(NormalizeArgs),
    /// Join province summaries onto boundary polygons as GeoJSON.
    Map(MapArgs),
    /// Print preview rows, correlations and scatter series.
    Explore(ExploreArgs),
    /// Predict the poverty rate from indicator values.
    Predict(PredictArgs),
}

#[derive(clap::Args)]
struct NormalizeArgs {
    /// Output file path. For CSV this receives the record table.
    #[arg(long)]
    output: PathBuf,

    /// Output representation.
    #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
    format: ExportFormat,

    /// Province summary path for CSV exports.
    #[arg(long)]
    provinces: Option<PathBuf>,
}

#[derive(clap::Args)]
struct MapArgs {
    /// Annotated GeoJSON output path.
    #[arg(long)]
    output: PathBuf,

    /// Boundary GeoJSON file or http(s) URL.
    #[arg(long)]
    boundaries: Option<String>,

    /// Feature property holding the province name.
    #[arg(long)]
    name_property: Option<String>,

    /// Timeout for remote boundary downloads.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(clap::Args)]
struct ExploreArgs {
    /// Write the report here instead of standard output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of preview rows.
    #[arg(long)]
    preview_rows: Option<usize>,
}

#[derive(clap::Args)]
struct PredictArgs {
    /// Feature values in model order.
    #[arg(num_args = 0.., allow_negative_numbers = true, conflicts_with = "features")]
    values: Vec<f64>,

    /// Named feature value, e.g. --feature "Rata-Rata Lama Sekolah=8.5".
    #[arg(long = "feature", value_parser = parse_named_feature)]
    features: Vec<(String, f64)>,

    /// Scaler artifact path.
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Model artifact path.
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MappingKind {
    Standard,
    SchoolParticipationProxy,
}

impl MappingKind {
    fn config_name(self) -> &'static str {
        match self {
            MappingKind::Standard => ColumnMapping::STANDARD.name(),
            MappingKind::SchoolParticipationProxy => ColumnMapping::SCHOOL_PARTICIPATION_PROXY.name(),
        }
    }
}
