use crate::catalog::bbox::BoundingBox;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    pub catalog: CatalogConfig,
    pub selection: SelectionConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_dataset() -> String {
    "global".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    pub min_magnitude: f64,
    pub start: NaiveDate,
    /// Defaults to today (UTC) when omitted.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default = "default_request_timeout", with = "duration_format")]
    pub timeout: Duration,
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId {
    pub network: String,
    pub station: String,
}

impl StationId {
    pub fn new(network: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
        }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.network, self.station)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub reference: StationId,
    pub networks: Vec<String>,
    /// Temporary network codes (X*, Y*, Z*) that are intentionally kept.
    #[serde(default)]
    pub allow_temporary: Vec<String>,
    #[serde(default)]
    pub channels: ChannelMode,
    #[serde(default = "default_channel_prefixes")]
    pub channel_prefixes: Vec<String>,
    #[serde(default)]
    pub stations: Vec<StationInventoryEntry>,
}

fn default_channel_prefixes() -> Vec<String> {
    ["LH", "BH", "HH", "EH", "SH"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Broadband,
    #[default]
    All,
}

/// Station metadata used to decide availability and to rank fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationInventoryEntry {
    pub network: String,
    pub station: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Fraction of the station's expected data actually archived, 0.0 to 1.0.
    #[serde(default = "default_completeness")]
    pub completeness: f64,
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_until: Option<DateTime<Utc>>,
}

fn default_completeness() -> f64 {
    1.0
}

impl StationInventoryEntry {
    pub fn id(&self) -> StationId {
        StationId::new(self.network.clone(), self.station.clone())
    }

    /// True when the station was recording for the whole window.
    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let from_ok = self.available_from.map_or(true, |from| from <= start);
        let until_ok = self.available_until.map_or(true, |until| until >= end);
        from_ok && until_ok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// How long before the origin time the animation starts.
    #[serde(default = "default_lead", with = "duration_format")]
    pub lead: Duration,
    #[serde(default = "default_window_duration", with = "duration_format")]
    pub duration: Duration,
}

fn default_lead() -> Duration {
    Duration::from_secs(20)
}

fn default_window_duration() -> Duration {
    Duration::from_secs(2400)
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lead: default_lead(),
            duration: default_window_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Map region name understood by the renderer (e.g. `ok`, `ok_local`).
    pub region: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_render_timeout", with = "duration_format")]
    pub timeout: Duration,
    #[serde(default = "default_pause_between", with = "duration_format")]
    pub pause_between: Duration,
}

fn default_render_timeout() -> Duration {
    Duration::from_secs(3600)
}

fn default_pause_between() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default)]
    pub skip_existing: bool,
}

fn default_filename_template() -> String {
    "{date}_Magnitude{mag}".to_string()
}

fn default_extension() -> String {
    "mp4".to_string()
}

fn default_decimal_separator() -> String {
    "_".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("gmv-batch.log")
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

// Custom serde module for duration parsing
pub(crate) mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else if let Some(v) = s.strip_suffix('h') {
            (v, "h")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let secs_per_unit = match unit {
            "ms" => return Ok(Duration::from_millis(value)),
            "s" => 1,
            "m" => 60,
            _ => 3600,
        };

        value
            .checked_mul(secs_per_unit)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {}", s))
    }

    pub fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if d.subsec_millis() != 0 || secs == 0 {
            format!("{}ms", d.as_millis())
        } else if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn station(from: Option<&str>, until: Option<&str>) -> StationInventoryEntry {
        StationInventoryEntry {
            network: "OK".to_string(),
            station: "SMO".to_string(),
            latitude: 35.5,
            longitude: -97.5,
            completeness: 1.0,
            available_from: from.map(|s| s.parse().unwrap()),
            available_until: until.map(|s| s.parse().unwrap()),
        }
    }

    #[test]
    fn test_station_covers_open_ended() {
        let start = Utc.with_ymd_and_hms(2016, 9, 3, 12, 0, 0).unwrap();
        let end = start + chrono::Duration::minutes(10);
        assert!(station(None, None).covers(start, end));
        assert!(station(Some("2010-01-01T00:00:00Z"), None).covers(start, end));
    }

    #[test]
    fn test_station_covers_rejects_partial_window() {
        let start = Utc.with_ymd_and_hms(2016, 9, 3, 12, 0, 0).unwrap();
        let end = start + chrono::Duration::minutes(10);
        let ends_mid_window = station(None, Some("2016-09-03T12:05:00Z"));
        assert!(!ends_mid_window.covers(start, end));

        let installed_later = station(Some("2017-01-01T00:00:00Z"), None);
        assert!(!installed_later.covers(start, end));
    }

    #[test]
    fn test_station_id_display() {
        assert_eq!(StationId::new("OK", "SMO").to_string(), "OK.SMO");
    }
}
