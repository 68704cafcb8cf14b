//! Static map options and results

use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::MapExtent;

/// Icon placed on a static map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    /// Position
    pub coordinate: Coordinate,
    /// Vendor icon id
    pub icon: Option<u32>,
}

/// Options of a static map
///
/// One of `locality`, `center` or `extent` must be set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticMapOptions {
    /// Center the map on a locality by name
    pub locality: Option<String>,
    /// Country of the locality
    pub country_code: Option<String>,
    /// Center the map on a coordinate
    pub center: Option<Coordinate>,
    /// Show this area
    pub extent: Option<MapExtent>,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
    /// Map scale
    pub scale: Option<u32>,
    /// Label options (`0` hides labels)
    pub label_op: Option<u32>,
    /// Icons to draw
    #[serde(default)]
    pub markers: Vec<MapMarker>,
}

/// A rendered map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMap {
    /// Image URL
    pub image_url: String,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
    /// Map scale
    pub scale: Option<u32>,
    /// Center
    pub center: Option<Coordinate>,
    /// Shown area
    pub extent: Option<MapExtent>,
}
