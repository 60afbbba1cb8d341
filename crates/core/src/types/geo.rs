//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// A coordinate is NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NotFinite,
    /// Longitude outside [-180, 180].
    #[error("longitude {0} is out of range (-180 to 180)")]
    LongitudeOutOfRange(f64),
    /// Latitude outside [-90, 90].
    #[error("latitude {0} is out of range (-90 to 90)")]
    LatitudeOutOfRange(f64),
}

/// A latitude/longitude rectangle, used to pre-filter candidates before an
/// exact distance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// A point on the globe, stored in `GeoJSON` order (longitude first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

impl GeoPoint {
    /// Mean Earth radius in meters, used for great-circle distances.
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// Create a validated point.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is not finite or out of range.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::LongitudeOutOfRange(lng));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Coordinates as `[lng, lat]`.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Great-circle distance to `other` in meters (haversine formula).
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * Self::EARTH_RADIUS_METERS * a.sqrt().asin()
    }

    /// Smallest lat/lng rectangle containing every point within
    /// `radius_meters` of this one.
    ///
    /// Near the poles, or when the box would cross the antimeridian, the
    /// longitude range widens to the full [-180, 180].
    #[must_use]
    pub fn bounding_box(&self, radius_meters: f64) -> BoundingBox {
        let d_lat = (radius_meters / Self::EARTH_RADIUS_METERS).to_degrees();
        let min_lat = (self.lat - d_lat).max(-90.0);
        let max_lat = (self.lat + d_lat).min(90.0);

        let cos_lat = self.lat.to_radians().cos();
        let (min_lng, max_lng) = if min_lat <= -90.0 || max_lat >= 90.0 || cos_lat <= f64::EPSILON {
            (-180.0, 180.0)
        } else {
            let d_lng = d_lat / cos_lat;
            let (lo, hi) = (self.lng - d_lng, self.lng + d_lng);
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        BoundingBox {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }
}
