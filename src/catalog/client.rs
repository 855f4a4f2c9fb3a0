use super::bbox::BoundingBox;
use super::event::RawEventRecord;
use crate::config::types::CatalogConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DataFetchError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, DataFetchError>;

/// Parameters of one catalog request.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub min_magnitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bbox: Option<BoundingBox>,
}

impl CatalogQuery {
    /// Builds the query for a configured catalog; an open end date means `today`.
    pub fn from_config(config: &CatalogConfig, today: NaiveDate) -> Self {
        Self {
            min_magnitude: config.min_magnitude,
            start: config.start,
            end: config.end.unwrap_or(today),
            bbox: config.bbox,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "geojson".to_string()),
            ("starttime", self.start.format("%Y-%m-%d").to_string()),
            ("endtime", self.end.format("%Y-%m-%d").to_string()),
            ("minmagnitude", self.min_magnitude.to_string()),
        ];

        if let Some(bbox) = &self.bbox {
            params.push(("minlatitude", bbox.min_lat.to_string()));
            params.push(("maxlatitude", bbox.max_lat.to_string()));
            params.push(("minlongitude", bbox.min_lon.to_string()));
            params.push(("maxlongitude", bbox.max_lon.to_string()));
        }

        params
    }
}

/// Anything that can answer a catalog query.
///
/// `Ok(vec![])` means the service answered and nothing matched; failures to
/// reach or understand the service are always `Err`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<RawEventRecord>>;
}

/// Client for an FDSN event web service speaking the USGS GeoJSON format.
#[derive(Debug)]
pub struct UsgsCatalog {
    url: String,
    client: reqwest::Client,
}

impl UsgsCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for UsgsCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<RawEventRecord>> {
        info!(
            url = %self.url,
            min_magnitude = query.min_magnitude,
            start = %query.start,
            end = %query.end,
            bbox = ?query.bbox,
            "Querying earthquake catalog"
        );

        let response = self
            .client
            .get(&self.url)
            .query(&query.to_params())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            debug!("Catalog answered 204 No Content");
            return Ok(Vec::new());
        }

        if !status.is_success() {
            return Err(DataFetchError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let records = parse_geojson(&body)?;
        info!(count = records.len(), "Catalog returned events");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: Option<String>,
    properties: Option<Properties>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    mag: Option<f64>,
    /// Milliseconds since the Unix epoch.
    time: Option<i64>,
    place: Option<String>,
    url: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

/// Parses a GeoJSON FeatureCollection body into raw records.
///
/// Individual features with missing or mistyped fields are kept as incomplete
/// raw records so the filter can count them; a body that is not a FeatureCollection is an error.
pub fn parse_geojson(body: &str) -> Result<Vec<RawEventRecord>> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| DataFetchError::Malformed(e.to_string()))?;

    if collection.kind != "FeatureCollection" {
        return Err(DataFetchError::Malformed(format!(
            "expected FeatureCollection, got {}",
            collection.kind
        )));
    }

    Ok(collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, value)| match serde_json::from_value::<Feature>(value) {
            Ok(feature) => feature_to_raw(feature),
            Err(e) => {
                // left empty so the filter counts it as malformed
                warn!(index, error = %e, "Unreadable catalog feature");
                RawEventRecord::default()
            }
        })
        .collect())
}

fn feature_to_raw(feature: Feature) -> RawEventRecord {
    let properties = feature.properties.unwrap_or_default();
    let coords = feature
        .geometry
        .map(|g| g.coordinates)
        .unwrap_or_default();
    let coord = |i: usize| coords.get(i).copied().flatten();

    RawEventRecord {
        id: feature.id.or(properties.code),
        time: properties.time.and_then(DateTime::<Utc>::from_timestamp_millis),
        magnitude: properties.mag,
        longitude: coord(0),
        latitude: coord(1),
        depth_km: coord(2),
        place: properties.place,
        url: properties.url,
    }
}
