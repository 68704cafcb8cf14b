//! Isochrone options and results

use domain::Coordinate;
use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: u64 = 60_000;

/// Budget an isochrone is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsochroneWeight {
    /// Travel time; caller values are minutes, the vendor expects milliseconds
    #[default]
    Time,
    /// Travel distance in meters, sent unchanged
    Distance,
}

impl IsochroneWeight {
    /// Vendor `weight` value
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Distance => "distance",
        }
    }

    /// Convert a caller value (minutes or meters) to the vendor unit
    #[must_use]
    pub const fn to_vendor(self, value: u64) -> u64 {
        match self {
            Self::Time => value.saturating_mul(MS_PER_MINUTE),
            Self::Distance => value,
        }
    }

    /// Convert a vendor level back to the caller unit
    #[must_use]
    pub const fn from_vendor(self, level: u64) -> u64 {
        match self {
            Self::Time => level / MS_PER_MINUTE,
            Self::Distance => level,
        }
    }

    /// Unit of caller values, for display
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Time => "min",
            Self::Distance => "m",
        }
    }
}

/// Polygon construction method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsochroneMethod {
    /// Tight outline following the network
    ConcaveHull,
    /// Convex envelope of the reachable nodes
    ConvexHull,
}

impl IsochroneMethod {
    /// Vendor `method` value
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::ConcaveHull => "concavehull",
            Self::ConvexHull => "convexhull",
        }
    }
}

/// Options of an isochrone calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IsochroneOptions {
    /// Time or distance budget
    #[serde(default)]
    pub weight: IsochroneWeight,
    /// Construction method, vendor default when unset
    pub method: Option<IsochroneMethod>,
}

/// One reachable area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Isochrone {
    /// Origin of the calculation
    pub center: Coordinate,
    /// Budget in caller units (minutes or meters)
    pub value: u64,
    /// Budget in vendor units (milliseconds or meters)
    pub level: u64,
    /// Budget kind
    pub weight: IsochroneWeight,
    /// `POLYGON` or `MULTIPOLYGON` outline
    pub wkt: String,
}
