use serde::Serialize;

use crate::indicators::mapping::{
    HUMAN_DEVELOPMENT_INDEX, MEAN_YEARS_OF_SCHOOLING, PER_CAPITA_EXPENDITURE,
};
use crate::indicators::table::Table;

/// Features plotted against the poverty rate on the exploration page.
pub const EXPLORATORY_FEATURES: &[&str] = &[
    PER_CAPITA_EXPENDITURE,
    MEAN_YEARS_OF_SCHOOLING,
    HUMAN_DEVELOPMENT_INDEX,
];

/// Pairwise Pearson correlations between the numeric columns of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, lhs: &str, rhs: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == lhs)?;
        let j = self.columns.iter().position(|c| c == rhs)?;
        self.values[i][j]
    }
}

/// Points of one feature plotted against a target column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub feature: String,
    pub target: String,
    pub points: Vec<(f64, f64)>,
}

/// First `n` rows of the table.
pub fn preview(table: &Table, n: usize) -> Table {
    table.head(n)
}

/// Correlates every pair of numeric columns using the rows where both values
/// are present. Pairs with fewer than two observations or zero variance have
/// no correlation.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let numeric: Vec<(&str, &[Option<f64>])> = table
        .columns()
        .iter()
        .filter_map(|column| column.as_numeric().map(|v| (column.name.as_str(), v)))
        .collect();

    let values: Vec<Vec<Option<f64>>> = numeric
        .iter()
        .map(|(_, lhs)| {
            numeric
                .iter()
                .map(|(_, rhs)| pearson(&complete_pairs(lhs, rhs)))
                .collect::<Vec<_>>()
        })
        .collect();

    CorrelationMatrix {
        columns: numeric.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    }
}

/// Scatter series for each exploratory feature present in the table.
pub fn scatter_series(table: &Table, target: &str) -> Vec<ScatterSeries> {
    let Some(target_values) = table.numeric(target) else {
        return Vec::new();
    };
    EXPLORATORY_FEATURES
        .iter()
        .filter_map(|feature| {
            table.numeric(feature).map(|values| ScatterSeries {
                feature: feature.to_string(),
                target: target.to_string(),
                points: complete_pairs(values, target_values),
            })
        })
        .collect()
}

fn complete_pairs(lhs: &[Option<f64>], rhs: &[Option<f64>]) -> Vec<(f64, f64)> {
    lhs.iter()
        .zip(rhs)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
