//! GPS tracks and map-matched segments

use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::RouteWeight;

/// One GPS fix of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Position
    pub coordinate: Coordinate,
    /// Compass heading in degrees
    pub compass: Option<u16>,
    /// Travel angle in degrees
    pub angle: Option<u16>,
    /// Speed in km/h
    pub speed: Option<u32>,
    /// Grouping attribute; consecutive points with the same value form one segment
    pub attribute: Option<String>,
}

impl GpsPoint {
    /// A bare position
    #[must_use]
    pub const fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            compass: None,
            angle: None,
            speed: None,
            attribute: None,
        }
    }
}

/// Options of a map-matching call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapToRoadOptions {
    /// Routing criterion used between fixes
    pub weight: Option<RouteWeight>,
    /// Maximum distance in meters between a fix and its road
    pub tolerance_m: Option<u32>,
    /// Report speeding with this tolerance in km/h
    pub speeding_tolerance: Option<u32>,
}

/// A matched road segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnappedSegment {
    /// Attribute of the fixes this segment was built from
    pub attribute: Option<String>,
    /// Length in meters
    pub distance_m: Option<f64>,
    /// Whether any fix exceeded the speed limit
    pub speeding: Option<bool>,
    /// `LINESTRING` geometry
    pub wkt: String,
}
