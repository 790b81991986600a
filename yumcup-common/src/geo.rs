//! Coordinate helpers
//!
//! Great-circle distance for filtering catalog results, and geohash cells
//! for keying the candidate cache by neighbourhood.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Reject NaN and out-of-range values
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Haversine distance in meters
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Base-32 geohash of the given length (1..=12)
    pub fn geohash(&self, precision: usize) -> Result<String> {
        let point = geohash::Coord {
            x: self.longitude,
            y: self.latitude,
        };
        geohash::encode(point, precision.clamp(1, 12))
            .map_err(|e| Error::InvalidInput(format!("cannot geohash {:?}: {}", self, e)))
    }
}
