//! Geolocation attached to a post.

use serde::{Deserialize, Serialize};

/// A validated latitude/longitude pair.
///
/// Only built through [`Coordinates::new`], which enforces
/// latitude in [-90, 90] and longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
    pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

    /// Returns `None` when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if Self::LATITUDE_RANGE.contains(&latitude) && Self::LONGITUDE_RANGE.contains(&longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
