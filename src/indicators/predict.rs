//! Point predictions of the poverty rate from exported model artifacts.
//!
//! Two JSON artifacts are produced by the training process: a feature scaler
//! (`{"mean": [..], "scale": [..]}`) and a linear model
//! (`{"coefficients": [..], "intercept": ..}`). Requests go through
//! [`Transformer::transform`] and then [`Regressor::predict`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::mapping::{
    HUMAN_DEVELOPMENT_INDEX, MEAN_YEARS_OF_SCHOOLING, PER_CAPITA_EXPENDITURE,
};

/// Feature order used when the model artifact does not name its features.
pub const DEFAULT_FEATURES: &[&str] = &[
    PER_CAPITA_EXPENDITURE,
    MEAN_YEARS_OF_SCHOOLING,
    HUMAN_DEVELOPMENT_INDEX,
];

pub trait Transformer {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}

pub trait Regressor {
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Standardizes each feature as `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn feature_count(&self) -> usize {
        self.mean.len()
    }

    fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(IndicatorError::InvalidModel(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }
}

impl Transformer for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        check_shape(self.feature_count(), features)?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // A constant training feature is stored with a zero scale.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Ordinary linear model: `intercept + Σ coefficient·x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl Regressor for LinearRegression {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_shape(self.coefficients.len(), features)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(coefficient, x)| coefficient * x)
                .sum::<f64>())
    }
}

/// Scaler and model bound together with the feature order they expect.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictor<T = StandardScaler, R = LinearRegression> {
    feature_names: Vec<String>,
    scaler: T,
    model: R,
}

impl Predictor<StandardScaler, LinearRegression> {
    /// Loads both artifacts and checks that their shapes agree.
    #[instrument(
        level = "info",
        skip_all,
        fields(scaler = %scaler_path.display(), model = %model_path.display())
    )]
    pub fn load(scaler_path: &Path, model_path: &Path) -> Result<Self> {
        let scaler: StandardScaler = read_artifact(scaler_path)?;
        let model: LinearRegression = read_artifact(model_path)?;
        let predictor = Self::from_parts(scaler, model)?;
        info!(
            features = predictor.feature_names.len(),
            "loaded prediction artifacts"
        );
        Ok(predictor)
    }

    pub fn from_parts(scaler: StandardScaler, model: LinearRegression) -> Result<Self> {
        scaler.validate()?;
        if scaler.feature_count() != model.coefficients.len() {
            return Err(IndicatorError::InvalidModel(format!(
                "scaler expects {} features but the model has {} coefficients",
                scaler.feature_count(),
                model.coefficients.len()
            )));
        }
        let feature_names = match &model.feature_names {
            Some(names) if names.len() == model.coefficients.len() => names.clone(),
            Some(names) => {
                return Err(IndicatorError::InvalidModel(format!(
                    "model names {} features but has {} coefficients",
                    names.len(),
                    model.coefficients.len()
                )));
            }
            None if model.coefficients.len() == DEFAULT_FEATURES.len() => {
                DEFAULT_FEATURES.iter().map(|name| name.to_string()).collect()
            }
            None => (0..model.coefficients.len())
                .map(|idx| format!("feature_{idx}"))
                .collect(),
        };
        Ok(Self {
            feature_names,
            scaler,
            model,
        })
    }
}

impl<T: Transformer, R: Regressor> Predictor<T, R> {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Predicts from features given in model order.
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let scaled = self.scaler.transform(features)?;
        let value = self.model.predict(&scaled)?;
        debug!(?features, value, "prediction");
        Ok(value)
    }

    /// Predicts from named features; every model feature must be present.
    pub fn predict_named(&self, features: &BTreeMap<String, f64>) -> Result<f64> {
        let ordered: Vec<f64> = self
            .feature_names
            .iter()
            .filter_map(|name| features.get(name).copied())
            .collect();
        if ordered.len() != self.feature_names.len() {
            return Err(IndicatorError::FeatureShape {
                expected: self.feature_names.len(),
                actual: ordered.len(),
            });
        }
        self.predict(&ordered)
    }
}

fn check_shape(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(IndicatorError::FeatureShape {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

fn read_artifact<A: DeserializeOwned>(path: &Path) -> Result<A> {
    if !path.exists() {
        return Err(IndicatorError::missing_source(path));
    }
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|err| IndicatorError::InvalidModel(format!("{}: {err}", path.display())))
}
