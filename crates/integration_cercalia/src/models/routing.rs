//! Routing options and results

use domain::Coordinate;
use serde::{Deserialize, Serialize};

/// Cost the route is optimized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteWeight {
    /// Fastest route
    #[default]
    Time,
    /// Shortest route
    Distance,
    /// Cheapest route (fuel and tolls)
    Money,
    /// Fastest route with live traffic
    Realtime,
}

impl RouteWeight {
    /// Vendor `weight` value
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Distance => "distance",
            Self::Money => "money",
            Self::Realtime => "realtime",
        }
    }
}

/// One truck restriction value and how strictly to honor it
///
/// With neither flag set the restriction is avoided.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionLimit {
    /// Kilograms for weights, centimeters for sizes
    pub value: f64,
    /// Never use roads violating the limit
    #[serde(default)]
    pub block: bool,
    /// Prefer roads within the limit
    #[serde(default)]
    pub avoid: bool,
}

impl DimensionLimit {
    /// A limit that is avoided but not blocked
    #[must_use]
    pub const fn avoid(value: f64) -> Self {
        Self {
            value,
            block: false,
            avoid: true,
        }
    }

    /// A limit that is blocked
    #[must_use]
    pub const fn block(value: f64) -> Self {
        Self {
            value,
            block: true,
            avoid: false,
        }
    }
}

/// Truck dimensions in caller units (kg and cm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TruckProfile {
    /// Gross weight in kilograms
    pub weight_kg: Option<DimensionLimit>,
    /// Axle weight in kilograms
    pub axle_weight_kg: Option<DimensionLimit>,
    /// Height in centimeters
    pub height_cm: Option<DimensionLimit>,
    /// Width in centimeters
    pub width_cm: Option<DimensionLimit>,
    /// Length in centimeters
    pub length_cm: Option<DimensionLimit>,
}

/// Options of a route calculation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Intermediate stops, in order
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
    /// Optimization criterion
    #[serde(default)]
    pub weight: RouteWeight,
    /// Avoid toll roads
    #[serde(default)]
    pub avoid_tolls: bool,
    /// Route for a truck with these dimensions
    pub truck: Option<TruckProfile>,
    /// Return the route geometry as WKT
    #[serde(default)]
    pub include_geometry: bool,
}

/// A calculated route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Vendor route identifier
    pub id: Option<String>,
    /// Length in meters
    pub distance_m: f64,
    /// Travel time in seconds
    pub duration_secs: u64,
    /// `LINESTRING` geometry when requested
    pub geometry_wkt: Option<String>,
    /// Criterion the route was optimized for
    pub weight: RouteWeight,
}

impl RouteResult {
    /// Length in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Travel time formatted as `H:MM:SS`
    #[must_use]
    pub fn duration_hms(&self) -> String {
        let secs = self.duration_secs;
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
