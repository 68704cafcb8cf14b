//! Points of interest and proximity searches

use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::{GeographicElement, RouteWeight};

/// A point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Vendor identifier
    pub id: Option<String>,
    /// Name
    pub name: Option<String>,
    /// Free text details (address, phone, ...)
    pub info: Option<String>,
    /// Category code, e.g. `"C001"`
    pub category_code: Option<String>,
    /// Subcategory code
    pub subcategory_code: Option<String>,
    /// Straight-line distance from the search center in meters
    pub distance_m: Option<f64>,
    /// Rank in the result list
    pub position: Option<u64>,
    /// Network distance from the search center in meters
    pub route_distance_m: Option<f64>,
    /// Network travel time from the search center in seconds
    pub route_time_secs: Option<u64>,
    /// Position
    pub coordinate: Coordinate,
    /// Address of the POI
    pub element: Option<GeographicElement>,
}

/// Options of a proximity search around a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityOptions {
    /// Search center
    pub center: Coordinate,
    /// Category codes; empty searches every category
    #[serde(default)]
    pub categories: Vec<String>,
    /// Maximum number of results
    pub count: Option<u32>,
    /// Search radius in meters
    pub radius_m: Option<u32>,
    /// Also compute network distance and time with this criterion
    pub routing: Option<RouteWeight>,
}

impl ProximityOptions {
    /// Search around a point with vendor defaults
    #[must_use]
    pub const fn new(center: Coordinate) -> Self {
        Self {
            center,
            categories: Vec::new(),
            count: None,
            radius_m: None,
            routing: None,
        }
    }
}

/// Rectangular map area, upper-left to lower-right
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapExtent {
    /// North-west corner
    pub upper_left: Coordinate,
    /// South-east corner
    pub lower_right: Coordinate,
}

impl MapExtent {
    /// Create an extent from its corners
    #[must_use]
    pub const fn new(upper_left: Coordinate, lower_right: Coordinate) -> Self {
        Self {
            upper_left,
            lower_right,
        }
    }

    /// `lat,lng|lat,lng` as used by `mapextent`
    #[must_use]
    pub fn to_param(&self) -> String {
        format!(
            "{}|{}",
            self.upper_left.to_lat_lng(),
            self.lower_right.to_lat_lng()
        )
    }

    /// Center of the extent
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.upper_left.latitude(), self.lower_right.latitude()),
            f64::midpoint(self.upper_left.longitude(), self.lower_right.longitude()),
        )
    }
}
