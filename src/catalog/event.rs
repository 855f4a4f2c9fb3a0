use crate::config::types::WindowConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event as it came off the catalog feed. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub id: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub magnitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub place: Option<String>,
    pub url: Option<String>,
}

/// A validated catalog event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub time: DateTime<Utc>,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub place: String,
    pub url: Option<String>,
}

impl EventRecord {
    /// Returns `None` when identifier, origin time, magnitude or a coordinate is missing.
    pub fn from_raw(raw: RawEventRecord) -> Option<Self> {
        let magnitude = raw.magnitude.filter(|m| m.is_finite())?;
        let latitude = raw.latitude.filter(|v| v.is_finite())?;
        let longitude = raw.longitude.filter(|v| v.is_finite())?;
        let id = raw.id.filter(|id| !id.trim().is_empty())?;

        Some(EventRecord {
            id,
            time: raw.time?,
            magnitude,
            latitude,
            longitude,
            depth_km: raw.depth_km.unwrap_or(0.0),
            place: raw.place.unwrap_or_else(|| "Unknown".to_string()),
            url: raw.url,
        })
    }

    /// Animation window: starts `lead` before the origin and lasts `duration`.
    pub fn window(&self, config: &WindowConfig) -> TimeWindow {
        let lead = chrono::Duration::from_std(config.lead).unwrap_or_else(|_| chrono::Duration::zero());
        let duration =
            chrono::Duration::from_std(config.duration).unwrap_or_else(|_| chrono::Duration::zero());
        let start = self.time - lead;
        TimeWindow {
            start,
            end: start + duration,
        }
    }

    /// Last comma-separated component of the place string
    /// ("8 km NW of Prague, Oklahoma" -> "Oklahoma").
    pub fn region(&self) -> &str {
        self.place
            .rsplit(", ")
            .next()
            .unwrap_or(self.place.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
