//! Geographic coordinate value object

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A WGS84 coordinate pair
///
/// Used both as input to every Cercalia operation and as output of every
/// parsed response. Construction does not validate ranges; use
/// [`Coordinate::try_new`] when the caller wants that check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    longitude: f64,
}

/// Error type for out-of-range coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
pub struct InvalidCoordinates;

impl Coordinate {
    /// Create a coordinate without range checks
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting out-of-range values
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` if latitude is not in [-90, 90]
    /// or longitude is not in [-180, 180]
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        let coordinate = Self::new(latitude, longitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(InvalidCoordinates)
        }
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Whether both components are finite and within range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// `lat,lng` as used by most Cercalia parameters (`mo`, `mo_o`, ...)
    #[must_use]
    pub fn to_lat_lng(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// `lng,lat` as used by geofencing points and GPS tracks
    #[must_use]
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }

    /// `lng lat`, the vertex notation inside WKT geometries
    #[must_use]
    pub fn to_wkt_pair(&self) -> String {
        format!("{} {}", self.longitude, self.latitude)
    }

    /// Great-circle distance to another coordinate in meters (Haversine)
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (lat1_rad.cos() * lat2_rad.cos()).mul_add(
            (delta_lon / 2.0).sin().powi(2),
            (delta_lat / 2.0).sin().powi(2),
        );
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_values() {
        let c = Coordinate::new(41.3851, 2.1734);
        assert!((c.latitude() - 41.3851).abs() < f64::EPSILON);
        assert!((c.longitude() - 2.1734).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_does_not_validate() {
        let c = Coordinate::new(120.0, 0.0);
        assert!(!c.is_valid());
    }

    #[test]
    fn test_try_new_bounds() {
        assert!(Coordinate::try_new(90.0, 180.0).is_ok());
        assert!(Coordinate::try_new(-90.0, -180.0).is_ok());
        assert!(Coordinate::try_new(91.0, 0.0).is_err());
        assert!(Coordinate::try_new(0.0, -181.0).is_err());
        assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_vendor_notations() {
        let c = Coordinate::new(40.4168, -3.7038);
        assert_eq!(c.to_lat_lng(), "40.4168,-3.7038");
        assert_eq!(c.to_lng_lat(), "-3.7038,40.4168");
        assert_eq!(c.to_wkt_pair(), "-3.7038 40.4168");
    }

    #[test]
    fn test_whole_numbers_have_no_fraction() {
        let c = Coordinate::new(41.0, 2.0);
        assert_eq!(c.to_lat_lng(), "41,2");
    }

    #[test]
    fn test_distance_barcelona_madrid() {
        let barcelona = Coordinate::new(41.3851, 2.1734);
        let madrid = Coordinate::new(40.4168, -3.7038);
        let distance = barcelona.distance_m(&madrid);
        // roughly 505 km as the crow flies
        assert!((distance - 505_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_display() {
        let c = Coordinate::new(41.3851, 2.1734);
        assert_eq!(c.to_string(), "41.385100, 2.173400");
    }

    #[test]
    fn test_serialization() {
        let c = Coordinate::new(41.3851, 2.1734);
        let json = serde_json::to_string(&c).expect("serialize");
        let back: Coordinate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(c, back);
    }
}
