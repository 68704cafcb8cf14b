//! Geofence shapes, points and matches

use domain::Coordinate;
use serde::{Deserialize, Serialize};

/// Geometry of a geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeofenceGeometry {
    /// Circle around a center
    Circle {
        /// Center
        center: Coordinate,
        /// Radius in meters
        radius_m: u32,
    },
    /// Polygon ring; closed automatically
    Polygon {
        /// Vertices in order
        vertices: Vec<Coordinate>,
    },
    /// Any WKT geometry, sent unchanged
    Wkt {
        /// Geometry text
        wkt: String,
    },
}

/// A named geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceShape {
    /// Identifier echoed back in matches
    pub id: String,
    /// Geometry
    pub geometry: GeofenceGeometry,
}

impl GeofenceShape {
    /// Circular geofence
    #[must_use]
    pub fn circle(id: impl Into<String>, center: Coordinate, radius_m: u32) -> Self {
        Self {
            id: id.into(),
            geometry: GeofenceGeometry::Circle { center, radius_m },
        }
    }

    /// Polygonal geofence
    #[must_use]
    pub fn polygon(id: impl Into<String>, vertices: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            geometry: GeofenceGeometry::Polygon { vertices },
        }
    }
}

/// A point tested against the geofences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofencePoint {
    /// Identifier echoed back in matches
    pub id: String,
    /// Position
    pub coordinate: Coordinate,
}

impl GeofencePoint {
    /// Create a point
    #[must_use]
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinate,
        }
    }
}

/// Points found inside one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceMatch {
    /// Shape identifier
    pub shape_id: String,
    /// Contained points; never empty
    pub points: Vec<GeofencePoint>,
}

impl GeofenceMatch {
    /// Whether the point with this id is inside the shape
    #[must_use]
    pub fn contains_point(&self, point_id: &str) -> bool {
        self.points.iter().any(|p| p.id == point_id)
    }
}
