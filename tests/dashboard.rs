use std::fs;
use std::path::Path;

use poverty_indicators::IndicatorError;
use poverty_indicators::config::Settings;
use poverty_indicators::dashboard::{self, Dashboard};
use poverty_indicators::io::{self, csv_read, excel_read};
use poverty_indicators::mapping::{
    MEAN_YEARS_OF_SCHOOLING, PER_CAPITA_EXPENDITURE, POVERTY_RATE, PROVINCE,
};
use tempfile::tempdir;

const DATASET: &str = "\
Provinsi,Kabupaten/Kota,Persentase Penduduk Miskin (P0) Menurut Kabupaten/Kota (Persen),Rata-rata Lama Sekolah Penduduk 15+ (Tahun),Pengeluaran per Kapita Disesuaikan (Ribu Rupiah/Orang/Tahun),Indeks Pembangunan Manusia
Aceh,Simeulue,18.98,9.48,7148,66.41
 aceh ,Aceh Singkil,20.36,8.68,8776,69.22
Bali,Jembrana,5.2,8.15,12264,72.69
BALI,Tabanan,4.8,8.95,14676,76.16
Papua,Merauke,10.2,8.78,11232,70.8
";

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("df_cleaned.csv");
    fs::write(&path, DATASET).expect("dataset written");
    path
}

fn write_boundaries(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("prov 34.geojson");
    let geojson = serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "ACEH"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "BALI"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "MALUKU"}, "geometry": null}
        ]
    });
    fs::write(&path, geojson.to_string()).expect("boundaries written");
    path
}

fn dashboard_for(dir: &Path) -> Dashboard {
    let settings = Settings {
        data_path: write_dataset(dir),
        boundaries: write_boundaries(dir).display().to_string(),
        ..Settings::default()
    };
    Dashboard::new(settings)
}

#[test]
fn dataset_is_loaded_once_per_path() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());

    let first = dashboard.dataset().expect("dataset loaded");
    fs::remove_file(&dashboard.settings().data_path).expect("dataset removed");
    let second = dashboard.dataset().expect("dataset served from cache");

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(dashboard.cached_datasets(), 1);

    dashboard.clear_cache();
    let error = dashboard.dataset().expect_err("cache cleared, file gone");
    assert!(matches!(error, IndicatorError::SourceNotFound(_)));
}

#[test]
fn missing_dataset_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = Settings {
        data_path: temp_dir.path().join("df_cleaned.csv"),
        ..Settings::default()
    };

    let error = Dashboard::new(settings)
        .dataset()
        .expect_err("dataset is absent");

    assert!(matches!(error, IndicatorError::SourceNotFound(_)));
}

#[test]
fn province_map_joins_summaries_to_features() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());

    let map = dashboard.province_map().expect("map assembled");

    assert_eq!(map.metric, POVERTY_RATE);
    assert_eq!(map.unmatched_features, vec!["MALUKU".to_string()]);
    assert_eq!(map.unmatched_provinces, vec!["PAPUA".to_string()]);
    let bali = &map.features.features[1].properties["indicators"];
    assert_eq!(bali[POVERTY_RATE], serde_json::json!(5.0));
    assert_eq!(bali[PER_CAPITA_EXPENDITURE], serde_json::json!(1122.5));
}

#[test]
fn province_map_requires_the_poverty_rate() {
    let temp_dir = tempdir().expect("temporary directory");
    let data_path = temp_dir.path().join("partial.csv");
    fs::write(&data_path, "Provinsi,Umur Harapan Hidup (Tahun)\nAceh,69.9\n")
        .expect("dataset written");
    let settings = Settings {
        data_path,
        boundaries: write_boundaries(temp_dir.path()).display().to_string(),
        ..Settings::default()
    };

    let error = Dashboard::new(settings)
        .province_map()
        .expect_err("poverty rate missing");

    match error {
        IndicatorError::MissingColumns { columns, .. } => {
            assert_eq!(columns, vec![POVERTY_RATE.to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn exploration_report_covers_available_features() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());

    let report = dashboard.exploration().expect("report built");

    assert_eq!(report.mapping, "standard");
    assert_eq!(report.preview.len(), 5);
    assert_eq!(report.preview[1][PROVINCE], serde_json::json!("ACEH"));
    assert_eq!(report.scatter.len(), 3);
    assert!(report.scatter.iter().all(|series| series.points.len() == 5));
    let self_correlation = report
        .correlations
        .get(MEAN_YEARS_OF_SCHOOLING, MEAN_YEARS_OF_SCHOOLING)
        .expect("correlation defined");
    assert!((self_correlation - 1.0).abs() < 1e-12);
}

#[test]
fn workbook_export_can_be_read_back() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());
    let dataset = dashboard.dataset().expect("dataset loaded");
    let xlsx_path = temp_dir.path().join("indicators.xlsx");

    dashboard::export_workbook(&dataset, &xlsx_path).expect("workbook written");
    let records = excel_read::read_table(&xlsx_path).expect("records sheet read");
    let via_dispatch = io::read_dataset(&xlsx_path).expect("workbook dispatched");

    assert_eq!(records.column_names(), dataset.records.column_names());
    assert_eq!(records.row_count(), 5);
    assert_eq!(
        records.numeric(PER_CAPITA_EXPENDITURE),
        dataset.records.numeric(PER_CAPITA_EXPENDITURE)
    );
    assert_eq!(via_dispatch, records);
}

#[test]
fn csv_export_writes_records_and_provinces() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());
    let dataset = dashboard.dataset().expect("dataset loaded");
    let records_path = temp_dir.path().join("records.csv");
    let provinces_path = temp_dir.path().join("provinces.csv");

    dashboard::export_csv(&dataset, &records_path, &provinces_path).expect("CSV written");

    let records = csv_read::read_table(&records_path).expect("records read");
    let provinces = csv_read::read_table(&provinces_path).expect("provinces read");
    assert_eq!(records.row_count(), 5);
    assert_eq!(provinces.row_count(), 3);
    assert_eq!(provinces.column_names()[0], PROVINCE);
    assert_eq!(
        provinces.numeric(POVERTY_RATE),
        Some(&[Some(19.67), Some(5.0), Some(10.2)][..])
    );
}

#[test]
fn json_report_is_written() {
    let temp_dir = tempdir().expect("temporary directory");
    let dashboard = dashboard_for(temp_dir.path());
    let output = temp_dir.path().join("explore.json");

    let report = dashboard.exploration().expect("report built");
    dashboard::write_json(&report, &output).expect("report written");

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("report read"))
            .expect("report parsed");
    assert_eq!(written["mapping"], serde_json::json!("standard"));
    assert!(written["correlations"]["columns"].is_array());
}
