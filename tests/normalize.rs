use std::collections::BTreeSet;

use poverty_indicators::IndicatorError;
use poverty_indicators::io::csv_read::read_table_from_reader;
use poverty_indicators::mapping::{
    ColumnMapping, HUMAN_DEVELOPMENT_INDEX, LIFE_EXPECTANCY, PER_CAPITA_EXPENDITURE, POVERTY_RATE,
    PROVINCE, SCHOOL_PARTICIPATION_RATE,
};
use poverty_indicators::normalize::{
    aggregate_by_province, normalize, normalize_key, select_columns,
};
use poverty_indicators::table::{Column, Table};

const EXPENDITURE_HEADER: &str = "Pengeluaran per Kapita Disesuaikan (Ribu Rupiah/Orang/Tahun)";
const POVERTY_HEADER: &str = "Persentase Penduduk Miskin (P0) Menurut Kabupaten/Kota (Persen)";

fn table(csv: &str) -> Table {
    read_table_from_reader(csv.as_bytes()).expect("CSV parsed")
}

#[test]
fn same_province_with_different_spelling_is_aggregated() {
    let raw = table(&format!(
        "Provinsi,{EXPENDITURE_HEADER}\n\" aceh \",12000\nACEH,18000\n"
    ));

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    assert_eq!(
        dataset.records.numeric(PER_CAPITA_EXPENDITURE),
        Some(&[Some(1000.0), Some(1500.0)][..])
    );
    assert_eq!(dataset.provinces.len(), 1);
    let aceh = &dataset.provinces[0];
    assert_eq!(aceh.province, "ACEH");
    assert_eq!(aceh.unit_count, 2);
    assert_eq!(aceh.indicator(PER_CAPITA_EXPENDITURE), Some(1250.0));
}

#[test]
fn expenditure_is_converted_to_monthly_values() {
    let raw = table(&format!(
        "Provinsi,{EXPENDITURE_HEADER}\nBali,15600\nBali,9000\nRiau,\n"
    ));

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    assert_eq!(
        dataset.records.numeric(PER_CAPITA_EXPENDITURE),
        Some(&[Some(1300.0), Some(750.0), None][..])
    );
}

#[test]
fn output_columns_are_the_mapped_subset_of_the_input() {
    let raw = table(&format!(
        "Provinsi,Kabupaten/Kota,{POVERTY_HEADER},Indeks Pembangunan Manusia\nJambi,Kerinci,7.1,70.2\n"
    ));

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    assert_eq!(
        dataset.records.column_names(),
        vec![PROVINCE, HUMAN_DEVELOPMENT_INDEX, POVERTY_RATE]
    );
    assert!(dataset.substitutions.is_empty());
}

#[test]
fn missing_optional_column_is_skipped() {
    let raw = table(&format!("Provinsi,{POVERTY_HEADER}\nPapua,26.5\n"));

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    assert!(!dataset.records.has_column(LIFE_EXPECTANCY));
    let summary = dataset.summary_table().expect("summary table");
    assert!(!summary.has_column(LIFE_EXPECTANCY));
    assert!(dataset.provinces[0].indicators.get(LIFE_EXPECTANCY).is_none());
}

#[test]
fn missing_province_column_is_reported() {
    let raw = table(&format!("{POVERTY_HEADER},{EXPENDITURE_HEADER}\n10.0,12000\n"));

    let error = normalize(&raw, &ColumnMapping::STANDARD).expect_err("key column required");

    assert!(matches!(error, IndicatorError::MissingKeyColumn(ref column) if column == PROVINCE));
}

#[test]
fn short_headers_are_not_selected() {
    let raw = table("Provinsi,Pengeluaran Per Kapita,PDRB,Umur Harapan Hidup\nAceh,1000,5,69.5\n");

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    assert_eq!(dataset.records.column_names(), vec![PROVINCE]);
    let aceh = dataset.province("aceh").expect("province present");
    assert_eq!(aceh.indicator(PER_CAPITA_EXPENDITURE), None);
    assert_eq!(aceh.indicator(LIFE_EXPECTANCY), None);
}

#[test]
fn only_the_long_form_expenditure_header_is_converted() {
    let raw = table(&format!(
        "Provinsi,Pengeluaran Per Kapita,{EXPENDITURE_HEADER}\nAceh,1,24000\n"
    ));

    let (records, _) = select_columns(&raw, &ColumnMapping::STANDARD).expect("selected");

    assert_eq!(records.column_names(), vec![PROVINCE, PER_CAPITA_EXPENDITURE]);
    assert_eq!(
        records.numeric(PER_CAPITA_EXPENDITURE),
        Some(&[Some(24000.0)][..])
    );
}

#[test]
fn repeated_unmapped_headers_are_renamed_and_dropped() {
    let raw = table("Provinsi,Catatan,Catatan,Tingkat Pengangguran Terbuka\nAceh,a,b,5\n");

    assert_eq!(
        raw.column_names(),
        vec!["Provinsi", "Catatan", "Catatan.1", "Tingkat Pengangguran Terbuka"]
    );
    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");
    assert_eq!(
        dataset.records.column_names(),
        vec![PROVINCE, "Tingkat Pengangguran Terbuka"]
    );
}

#[test]
fn group_mean_of_canonical_values() {
    let records = Table::from_columns(vec![
        Column::text(
            PROVINCE,
            vec![Some("ACEH".into()), Some("ACEH".into()), Some("BALI".into())],
        ),
        Column::numeric(
            PER_CAPITA_EXPENDITURE,
            vec![Some(1200.0), Some(1800.0), Some(900.0)],
        ),
    ])
    .expect("table built");

    let summaries = aggregate_by_province(&records, PROVINCE).expect("aggregated");

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].indicator(PER_CAPITA_EXPENDITURE), Some(1500.0));
    assert_eq!(summaries[1].indicator(PER_CAPITA_EXPENDITURE), Some(900.0));
}

#[test]
fn one_summary_per_distinct_province() {
    let raw = table(&format!(
        "Provinsi,{POVERTY_HEADER}\nAceh,10\n aceh,12\nBali,4\nBALI ,6\nPapua,26\nJambi,\n,3\n"
    ));

    let dataset = normalize(&raw, &ColumnMapping::STANDARD).expect("normalized");

    let names: Vec<&str> = dataset.provinces.iter().map(|p| p.province.as_str()).collect();
    let distinct: BTreeSet<&str> = names.iter().copied().collect();
    assert_eq!(names.len(), distinct.len());
    assert_eq!(
        distinct,
        BTreeSet::from(["ACEH", "BALI", "JAMBI", "PAPUA"])
    );
    let jambi = dataset.province("Jambi").expect("jambi present");
    assert_eq!(jambi.indicator(POVERTY_RATE), None);
    assert_eq!(dataset.province("bali").and_then(|p| p.indicator(POVERTY_RATE)), Some(5.0));
}

#[test]
fn text_columns_are_not_averaged() {
    let records = Table::from_columns(vec![
        Column::text(PROVINCE, vec![Some("ACEH".into())]),
        Column::text("Catatan", vec![Some("revisi".into())]),
        Column::numeric(POVERTY_RATE, vec![Some(14.5)]),
    ])
    .expect("table built");

    let summaries = aggregate_by_province(&records, PROVINCE).expect("aggregated");

    assert_eq!(summaries[0].indicators.len(), 1);
    assert_eq!(summaries[0].indicator(POVERTY_RATE), Some(14.5));
}

#[test]
fn key_normalization_is_idempotent() {
    for name in ["  Jawa Barat ", "DKI JAKARTA", "kepulauan riau\t", ""] {
        let once = normalize_key(name);
        assert_eq!(normalize_key(&once), once);
    }
    assert_eq!(normalize_key("  Jawa Barat "), "JAWA BARAT");
}

#[test]
fn proxy_mapping_reports_the_substitution() {
    let raw = table(&format!(
        "Provinsi,Indeks Pembangunan Manusia,{POVERTY_HEADER}\nAceh,72.8,14.6\n"
    ));

    let dataset =
        normalize(&raw, &ColumnMapping::SCHOOL_PARTICIPATION_PROXY).expect("normalized");

    assert_eq!(dataset.mapping, "school-participation-proxy");
    assert!(dataset.records.has_column(SCHOOL_PARTICIPATION_RATE));
    assert!(!dataset.records.has_column(HUMAN_DEVELOPMENT_INDEX));
    assert_eq!(dataset.substitutions.len(), 1);
    assert_eq!(dataset.substitutions[0].source, HUMAN_DEVELOPMENT_INDEX);
    assert_eq!(dataset.substitutions[0].canonical, SCHOOL_PARTICIPATION_RATE);
}

#[test]
fn mappings_are_found_by_name() {
    assert_eq!(
        ColumnMapping::by_name("standard").expect("standard mapping"),
        ColumnMapping::STANDARD
    );
    assert!(matches!(
        ColumnMapping::by_name("legacy"),
        Err(IndicatorError::UnknownMapping(_))
    ));
}
