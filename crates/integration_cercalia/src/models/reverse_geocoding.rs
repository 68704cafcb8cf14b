//! Reverse geocoding levels and results

use chrono::{DateTime, FixedOffset, Utc};
use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::GeographicElement;

/// Maximum number of coordinates in one batch request
pub const MAX_BATCH_SIZE: usize = 100;

/// Administrative level the vendor resolves a coordinate to (`rqge`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverseGeocodeLevel {
    /// Nearest address
    #[default]
    Address,
    /// Nearest street
    Street,
    /// Locality
    Locality,
    /// Postal code
    PostalCode,
    /// Municipality
    Municipality,
    /// Subregion (province)
    Subregion,
    /// Region
    Region,
    /// Country
    Country,
    /// Time zone
    Timezone,
}

impl ReverseGeocodeLevel {
    /// Vendor `rqge` value
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Address => "adr",
            Self::Street => "st",
            Self::Locality => "ct",
            Self::PostalCode => "pcode",
            Self::Municipality => "mun",
            Self::Subregion => "subreg",
            Self::Region => "reg",
            Self::Country => "cty",
            Self::Timezone => "timezone",
        }
    }
}

/// Place found at a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocodeResult {
    /// Resolved place
    pub element: GeographicElement,
    /// Distance from the query coordinate in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

/// One entry of a batch reverse geocoding call, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReverseGeocode {
    /// Query coordinate
    pub coordinate: Coordinate,
    /// Resolved place, `None` when the vendor found nothing for it
    pub result: Option<ReverseGeocodeResult>,
}

/// Time zone at a coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    /// IANA identifier, e.g. `"Europe/Madrid"`
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Local time at the requested instant
    pub local_time: Option<DateTime<FixedOffset>>,
    /// Requested instant in UTC
    pub utc_time: Option<DateTime<Utc>>,
    /// Offset from UTC in milliseconds, daylight saving excluded
    pub utc_offset_ms: i64,
    /// Daylight saving shift in milliseconds (0 when not in effect)
    pub daylight_saving_ms: i64,
}

impl TimezoneInfo {
    /// Total offset from UTC in seconds
    #[must_use]
    pub const fn total_offset_secs(&self) -> i64 {
        (self.utc_offset_ms + self.daylight_saving_ms) / 1000
    }

    /// Whether daylight saving time is in effect
    #[must_use]
    pub const fn is_daylight_saving(&self) -> bool {
        self.daylight_saving_ms != 0
    }
}
