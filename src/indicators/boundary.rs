//! Province boundary polygons and the name join against province summaries.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::indicators::cache::{SourceId, is_url};
use crate::indicators::error::{IndicatorError, Result};
use crate::indicators::normalize::{ProvinceSummary, normalize_key};

/// Feature property holding the province name.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// Where boundary data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    File(PathBuf),
    Url(String),
}

impl BoundarySource {
    pub fn from_location(location: &str) -> Self {
        if is_url(location) {
            BoundarySource::Url(location.to_string())
        } else {
            BoundarySource::File(PathBuf::from(location))
        }
    }

    pub fn id(&self) -> SourceId {
        match self {
            BoundarySource::File(path) => SourceId::Path(path.clone()),
            BoundarySource::Url(url) => SourceId::Url(url.clone()),
        }
    }
}

/// A GeoJSON `FeatureCollection`. Members other than `features` are kept
/// verbatim so an annotated copy can be written back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    /// Raw name stored under `property`, when it is a string.
    pub fn name(&self, property: &str) -> Option<&str> {
        self.properties.get(property).and_then(Value::as_str)
    }
}

/// Parses a GeoJSON document, requiring a `FeatureCollection` at the root.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection> {
    let collection: FeatureCollection = serde_json::from_str(text)
        .map_err(|err| IndicatorError::InvalidBoundaries(err.to_string()))?;
    if collection.kind != "FeatureCollection" {
        return Err(IndicatorError::InvalidBoundaries(format!(
            "expected a FeatureCollection, found '{}'",
            collection.kind
        )));
    }
    Ok(collection)
}

/// Loads boundary data from a local file or an HTTP endpoint. Remote
/// failures are reported once and never retried.
#[instrument(level = "info", skip_all, fields(source = %source.id()))]
pub fn load_boundaries(source: &BoundarySource, timeout: Duration) -> Result<FeatureCollection> {
    let text = match source {
        BoundarySource::File(path) => read_local(path)?,
        BoundarySource::Url(url) => fetch_remote(url, timeout)?,
    };
    let collection = parse_feature_collection(&text)?;
    info!(
        feature_count = collection.features.len(),
        "loaded boundary features"
    );
    Ok(collection)
}

fn read_local(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(IndicatorError::missing_source(path));
    }
    Ok(fs::read_to_string(path)?)
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<String> {
    let remote_error = |err: reqwest::Error| IndicatorError::RemoteFetch {
        url: url.to_string(),
        reason: err.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(remote_error)?;
    let response = client.get(url).send().map_err(remote_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(IndicatorError::RemoteFetch {
            url: url.to_string(),
            reason: format!("HTTP status {status}"),
        });
    }
    debug!(%status, "boundary data fetched");
    response.text().map_err(remote_error)
}

/// Result of matching boundary features to province summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryJoin<'a> {
    /// Feature index paired with the summary it matched.
    pub matched: Vec<(usize, &'a ProvinceSummary)>,
    /// Feature names with no province summary.
    pub unmatched_features: Vec<String>,
    /// Province names with no boundary feature.
    pub unmatched_provinces: Vec<String>,
}

/// Joins features to summaries by equality of normalized names.
pub fn join_provinces<'a>(
    collection: &FeatureCollection,
    provinces: &'a [ProvinceSummary],
    property: &str,
) -> BoundaryJoin<'a> {
    let mut matched = Vec::new();
    let mut unmatched_features = Vec::new();
    let mut used = vec![false; provinces.len()];

    for (idx, feature) in collection.features.iter().enumerate() {
        let Some(name) = feature.name(property) else {
            debug!(feature = idx, property, "feature has no name property");
            continue;
        };
        let key = normalize_key(name);
        match provinces.iter().position(|summary| summary.province == key) {
            Some(pos) => {
                used[pos] = true;
                matched.push((idx, &provinces[pos]));
            }
            None => unmatched_features.push(name.to_string()),
        }
    }

    let unmatched_provinces: Vec<String> = provinces
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(summary, _)| summary.province.clone())
        .collect();

    if !unmatched_features.is_empty() || !unmatched_provinces.is_empty() {
        warn!(
            unmatched_features = unmatched_features.len(),
            unmatched_provinces = unmatched_provinces.len(),
            "boundary join left names unmatched"
        );
    }

    BoundaryJoin {
        matched,
        unmatched_features,
        unmatched_provinces,
    }
}

/// Returns a copy of `collection` where every feature matched by `join`
/// carries the province indicators and the number of averaged units in its
/// properties. `join` must come from [`join_provinces`] on the same collection.
pub fn annotate_features(
    collection: &FeatureCollection,
    join: &BoundaryJoin<'_>,
) -> FeatureCollection {
    let mut annotated = collection.clone();
    for (idx, summary) in &join.matched {
        let Some(feature) = annotated.features.get_mut(*idx) else {
            continue;
        };
        let properties = &mut feature.properties;
        properties.insert("indicators".to_string(), json!(summary.indicators));
        properties.insert("unit_count".to_string(), json!(summary.unit_count));
    }
    annotated
}
