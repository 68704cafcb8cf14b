//! Autocomplete suggestions

use domain::{AdminEntity, Coordinate};
use serde::{Deserialize, Serialize};

/// Kind of suggestion to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestKind {
    /// Streets
    Street,
    /// Localities
    City,
    /// Postal codes
    PostalCode,
    /// Points of interest
    Poi,
    /// Road milestones
    Milestone,
    /// Roads
    Road,
}

impl SuggestKind {
    /// Vendor `type` value
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::City => "city",
            Self::PostalCode => "postalcode",
            Self::Poi => "poi",
            Self::Milestone => "milestone",
            Self::Road => "road",
        }
    }
}

/// Options of an autocomplete query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestOptions {
    /// Text typed so far
    pub text: String,
    /// Restrict to a country
    pub country_code: Option<String>,
    /// Maximum number of suggestions
    pub limit: Option<u32>,
    /// Rank results near this point first
    pub center: Option<Coordinate>,
    /// Restrict to these kinds; empty asks for all
    #[serde(default)]
    pub kinds: Vec<SuggestKind>,
}

impl SuggestOptions {
    /// Suggestions for a text with vendor defaults
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            country_code: None,
            limit: None,
            center: None,
            kinds: Vec::new(),
        }
    }
}

/// House number availability of a street suggestion
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HouseNumbers {
    /// Whether the street has numbered addresses
    pub available: bool,
    /// Lowest number
    pub min: Option<u32>,
    /// Highest number
    pub max: Option<u32>,
    /// Number matched from the typed text
    pub current: Option<u32>,
    /// Rendering hint for the number
    pub hint: Option<String>,
}

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Vendor identifier
    pub id: Option<String>,
    /// Suggestion kind as reported (`street`, `city`, ...)
    pub kind: Option<String>,
    /// Display text
    pub description: String,
    /// Relevance score
    pub score: Option<f64>,
    /// Street, code and name
    pub street: Option<AdminEntity>,
    /// Street description including its type (`Calle`, `Avenida`)
    pub street_description: Option<String>,
    /// Locality
    pub locality: Option<AdminEntity>,
    /// Municipality
    pub municipality: Option<AdminEntity>,
    /// Subregion
    pub subregion: Option<AdminEntity>,
    /// Region
    pub region: Option<AdminEntity>,
    /// Country
    pub country: Option<AdminEntity>,
    /// Postal code
    pub postal_code: Option<String>,
    /// House number availability
    pub house_numbers: Option<HouseNumbers>,
    /// Position, when the vendor includes it
    pub coordinate: Option<Coordinate>,
}

/// Resolve a chosen suggestion to a position
///
/// At least one of `city_code` or `street_code` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestGeocodeOptions {
    /// Locality code from a suggestion
    pub city_code: Option<String>,
    /// Street code from a suggestion
    pub street_code: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// House number
    pub house_number: Option<String>,
    /// Country code
    pub country_code: Option<String>,
}

/// Position of a resolved suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestGeocodeResult {
    /// Position
    pub coordinate: Coordinate,
    /// Display name
    pub name: Option<String>,
    /// House number
    pub house_number: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Street
    pub street: Option<AdminEntity>,
    /// Locality
    pub locality: Option<AdminEntity>,
    /// Municipality
    pub municipality: Option<AdminEntity>,
    /// Subregion
    pub subregion: Option<AdminEntity>,
    /// Region
    pub region: Option<AdminEntity>,
    /// Country
    pub country: Option<AdminEntity>,
}
