use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    #[error("latitude values must be between -90 and 90 (got {min} .. {max})")]
    LatitudeOutOfRange { min: f64, max: f64 },

    #[error("longitude values must be between -180 and 180 (got {min} .. {max})")]
    LongitudeOutOfRange { min: f64, max: f64 },

    #[error("min values must be <= max values")]
    Inverted,
}

/// Geographic rectangle in decimal degrees. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, BboxError> {
        let bbox = BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Checks ranges and ordering. Deserialized boxes are validated at config load.
    pub fn validate(&self) -> Result<(), BboxError> {
        if !(-90.0..=90.0).contains(&self.min_lat) || !(-90.0..=90.0).contains(&self.max_lat) {
            return Err(BboxError::LatitudeOutOfRange {
                min: self.min_lat,
                max: self.max_lat,
            });
        }

        if !(-180.0..=180.0).contains(&self.min_lon) || !(-180.0..=180.0).contains(&self.max_lon) {
            return Err(BboxError::LongitudeOutOfRange {
                min: self.min_lon,
                max: self.max_lon,
            });
        }

        if self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(BboxError::Inverted);
        }

        Ok(())
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// Oklahoma, as used by the regional dataset.
    pub fn oklahoma() -> Self {
        BoundingBox {
            min_lat: 33.6,
            max_lat: 37.0,
            min_lon: -103.0,
            max_lon: -94.4,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bbox_coords_are_within_ranges() {
        assert!(BoundingBox::new(33.6, 37.0, -103.0, -94.4).is_ok());

        assert!(matches!(
            BoundingBox::new(-100.0, 0.0, 0.0, 10.0),
            Err(BboxError::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            BoundingBox::new(0.0, 10.0, 0.0, 200.0),
            Err(BboxError::LongitudeOutOfRange { .. })
        ));
        assert_eq!(
            BoundingBox::new(10.0, 0.0, 0.0, 10.0),
            Err(BboxError::Inverted)
        );
        assert_eq!(
            BoundingBox::new(0.0, 10.0, 10.0, 0.0),
            Err(BboxError::Inverted)
        );
    }

    #[test]
    fn test_contains_is_inclusive_on_edges() {
        let ok = BoundingBox::oklahoma();
        assert!(ok.contains(35.5, -96.7));
        assert!(ok.contains(33.6, -103.0));
        assert!(ok.contains(37.0, -94.4));
        assert!(!ok.contains(37.01, -96.0));
        assert!(!ok.contains(38.3, 142.4));
    }
}
