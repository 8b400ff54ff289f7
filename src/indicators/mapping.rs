//! Column mapping configurations.
//!
//! Statistics-agency exports carry long, human-authored headers. A
//! [`ColumnMapping`] is an explicit table of `source header → canonical name`
//! rules; the normalizer keeps only the rules whose source column exists.

use serde::Serialize;

use crate::indicators::error::{IndicatorError, Result};

pub const PROVINCE: &str = "Provinsi";
pub const HUMAN_DEVELOPMENT_INDEX: &str = "Indeks Pembangunan Manusia";
pub const POVERTY_RATE: &str = "Persentase Kemiskinan (P0)";
pub const MEAN_YEARS_OF_SCHOOLING: &str = "Rata-Rata Lama Sekolah";
pub const PER_CAPITA_EXPENDITURE: &str = "Pengeluaran Per Kapita";
pub const LIFE_EXPECTANCY: &str = "Umur Harapan Hidup";
pub const SANITATION_ACCESS: &str = "Akses Sanitasi Layak";
pub const DRINKING_WATER_ACCESS: &str = "Akses Air Minum Layak";
pub const UNEMPLOYMENT_RATE: &str = "Tingkat Pengangguran Terbuka";
pub const LABOR_FORCE_PARTICIPATION: &str = "Tingkat Partisipasi Angkatan Kerja";
pub const GROSS_REGIONAL_PRODUCT: &str = "PDRB";
pub const SCHOOL_PARTICIPATION_RATE: &str = "Angka Partisipasi Sekolah";

/// A single `source → canonical` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnRule {
    /// Header as it appears in the raw export.
    pub source: &'static str,
    /// Short canonical name used downstream.
    pub canonical: &'static str,
    /// Set when the canonical name is a stand-in for a different quantity.
    pub substitution: Option<&'static str>,
}

impl ColumnRule {
    const fn rename(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            substitution: None,
        }
    }

    const fn proxy(source: &'static str, canonical: &'static str, note: &'static str) -> Self {
        Self {
            source,
            canonical,
            substitution: Some(note),
        }
    }
}

/// A semantic substitution applied while normalizing, reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub source: String,
    pub canonical: String,
    pub note: String,
}

const STANDARD_RULES: &[ColumnRule] = &[
    ColumnRule::rename("Provinsi", PROVINCE),
    ColumnRule::rename("Indeks Pembangunan Manusia", HUMAN_DEVELOPMENT_INDEX),
    ColumnRule::rename(
        "Persentase Penduduk Miskin (P0) Menurut Kabupaten/Kota (Persen)",
        POVERTY_RATE,
    ),
    ColumnRule::rename(
        "Rata-rata Lama Sekolah Penduduk 15+ (Tahun)",
        MEAN_YEARS_OF_SCHOOLING,
    ),
    ColumnRule::rename(
        "Pengeluaran per Kapita Disesuaikan (Ribu Rupiah/Orang/Tahun)",
        PER_CAPITA_EXPENDITURE,
    ),
    ColumnRule::rename("Umur Harapan Hidup (Tahun)", LIFE_EXPECTANCY),
    ColumnRule::rename(
        "Persentase rumah tangga yang memiliki akses terhadap sanitasi layak",
        SANITATION_ACCESS,
    ),
    ColumnRule::rename(
        "Persentase rumah tangga yang memiliki akses terhadap air minum layak",
        DRINKING_WATER_ACCESS,
    ),
    ColumnRule::rename("Tingkat Pengangguran Terbuka", UNEMPLOYMENT_RATE),
    ColumnRule::rename(
        "Tingkat Partisipasi Angkatan Kerja",
        LABOR_FORCE_PARTICIPATION,
    ),
    ColumnRule::rename(
        "PDRB atas Dasar Harga Konstan menurut Pengeluaran (Rupiah)",
        GROSS_REGIONAL_PRODUCT,
    ),
];

const SCHOOL_PARTICIPATION_PROXY_RULES: &[ColumnRule] = &[
    ColumnRule::rename("Provinsi", PROVINCE),
    ColumnRule::proxy(
        "Indeks Pembangunan Manusia",
        SCHOOL_PARTICIPATION_RATE,
        "human development index values stand in for the school participation rate",
    ),
    ColumnRule::rename(
        "Persentase Penduduk Miskin (P0) Menurut Kabupaten/Kota (Persen)",
        POVERTY_RATE,
    ),
    ColumnRule::rename(
        "Rata-rata Lama Sekolah Penduduk 15+ (Tahun)",
        MEAN_YEARS_OF_SCHOOLING,
    ),
    ColumnRule::rename(
        "Pengeluaran per Kapita Disesuaikan (Ribu Rupiah/Orang/Tahun)",
        PER_CAPITA_EXPENDITURE,
    ),
];

/// A named, enumerated mapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    name: &'static str,
    rules: &'static [ColumnRule],
}

impl ColumnMapping {
    /// The authoritative mapping used by the dashboard pages.
    pub const STANDARD: ColumnMapping = ColumnMapping {
        name: "standard",
        rules: STANDARD_RULES,
    };

    /// Variant where the human development index is used as a proxy for the
    /// school participation rate feature.
    pub const SCHOOL_PARTICIPATION_PROXY: ColumnMapping = ColumnMapping {
        name: "school-participation-proxy",
        rules: SCHOOL_PARTICIPATION_PROXY_RULES,
    };

    pub const ALL: &'static [ColumnMapping] =
        &[Self::STANDARD, Self::SCHOOL_PARTICIPATION_PROXY];

    /// Looks up a configuration by its name.
    pub fn by_name(name: &str) -> Result<ColumnMapping> {
        Self::ALL
            .iter()
            .copied()
            .find(|mapping| mapping.name == name)
            .ok_or_else(|| IndicatorError::UnknownMapping(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &'static [ColumnRule] {
        self.rules
    }

    /// Canonical name of the province grouping column.
    pub fn key_column(&self) -> &'static str {
        PROVINCE
    }

    pub fn canonical_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.canonical).collect()
    }

    /// Rules whose source header is present in `headers`, in mapping order.
    /// Headers matching no source are not selected.
    pub fn resolve(&self, headers: &[&str]) -> Vec<ColumnRule> {
        self.rules
            .iter()
            .filter(|rule| headers.contains(&rule.source))
            .copied()
            .collect()
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::STANDARD
    }
}
