//! Geocoding options and results

use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::GeographicElement;

/// Country code applied when the caller does not set one
pub const DEFAULT_COUNTRY_CODE: &str = "ESP";

/// Structured address search
///
/// Empty strings count as absent. At least one of street, postal code,
/// locality, municipality, subregion or region must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodingOptions {
    /// Street name, optionally with house number
    pub street: Option<String>,
    /// House number, appended to the street
    pub house_number: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Locality (city, town, village)
    pub locality: Option<String>,
    /// Municipality
    pub municipality: Option<String>,
    /// Subregion (province)
    pub subregion: Option<String>,
    /// Region
    pub region: Option<String>,
    /// ISO 3166-1 alpha-3 country code
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// Maximum number of candidates
    pub limit: Option<u32>,
    /// Ask the vendor for a full (slower, more tolerant) search
    #[serde(default)]
    pub full_search: bool,
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

impl Default for GeocodingOptions {
    fn default() -> Self {
        Self {
            street: None,
            house_number: None,
            postal_code: None,
            locality: None,
            municipality: None,
            subregion: None,
            region: None,
            country_code: default_country_code(),
            limit: None,
            full_search: false,
        }
    }
}

impl GeocodingOptions {
    /// Street address in a locality
    #[must_use]
    pub fn address(street: impl Into<String>, locality: impl Into<String>) -> Self {
        Self {
            street: Some(street.into()),
            locality: Some(locality.into()),
            ..Default::default()
        }
    }

    /// Locality by name
    #[must_use]
    pub fn locality(name: impl Into<String>) -> Self {
        Self {
            locality: Some(name.into()),
            ..Default::default()
        }
    }
}

/// One geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingCandidate {
    /// Matched place with its administrative hierarchy
    pub element: GeographicElement,
    /// Position of the match
    pub coordinate: Coordinate,
    /// Vendor relevance score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Display label
    pub label: String,
}
