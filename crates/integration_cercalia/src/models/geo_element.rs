//! Geographic element shared by geocoding, reverse geocoding and POI results

use std::fmt;

use domain::{AdminEntity, Coordinate};
use serde::{Deserialize, Serialize};

/// Kind of a geographic element as reported by the vendor `@type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeoElementKind {
    /// Street address with house number
    Address,
    /// Street without house number
    Street,
    /// Locality (city, town, village)
    Locality,
    /// Postal code area
    PostalCode,
    /// Municipality
    Municipality,
    /// Subregion (province)
    Subregion,
    /// Region (autonomous community, state)
    Region,
    /// Country
    Country,
    /// Point of interest
    Poi,
    /// Road
    Road,
    /// Road milestone (kilometer point)
    Milestone,
    /// Type code this client does not know
    Other(String),
    /// No type given
    #[default]
    Unknown,
}

impl GeoElementKind {
    /// Parse a vendor type code
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "adr" => Self::Address,
            "st" => Self::Street,
            "ct" | "ctn" | "city" => Self::Locality,
            "pc" | "pcode" => Self::PostalCode,
            "mun" => Self::Municipality,
            "subreg" => Self::Subregion,
            "reg" => Self::Region,
            "cty" | "ctry" => Self::Country,
            "poi" => Self::Poi,
            "rd" => Self::Road,
            "km" | "pk" => Self::Milestone,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Vendor type code
    #[must_use]
    pub fn as_code(&self) -> &str {
        match self {
            Self::Address => "adr",
            Self::Street => "st",
            Self::Locality => "ct",
            Self::PostalCode => "pc",
            Self::Municipality => "mun",
            Self::Subregion => "subreg",
            Self::Region => "reg",
            Self::Country => "cty",
            Self::Poi => "poi",
            Self::Road => "rd",
            Self::Milestone => "km",
            Self::Other(code) => code,
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for GeoElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// A `ge` node: one place with its full administrative hierarchy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeographicElement {
    /// Vendor identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name (street name, locality name, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Element kind
    #[serde(default)]
    pub kind: GeoElementKind,
    /// House number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    /// Postal code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Street
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<AdminEntity>,
    /// Locality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<AdminEntity>,
    /// Municipality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<AdminEntity>,
    /// Subregion (province)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subregion: Option<AdminEntity>,
    /// Region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<AdminEntity>,
    /// Country
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<AdminEntity>,
    /// Position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl GeographicElement {
    /// One-line label, e.g. `"Carrer de Balmes 10, 08007 Barcelona"`
    #[must_use]
    pub fn label(&self) -> String {
        let mut head = self.name.clone().unwrap_or_default();
        if let Some(number) = &self.house_number {
            head = format!("{head} {number}").trim().to_string();
        }

        let place = self
            .locality
            .as_ref()
            .or(self.municipality.as_ref())
            .map(|e| e.name.as_str());
        let tail = match (&self.postal_code, place) {
            (Some(pc), Some(place)) => Some(format!("{pc} {place}")),
            (None, Some(place)) => Some(place.to_string()),
            (Some(pc), None) => Some(pc.clone()),
            (None, None) => None,
        };

        match tail {
            Some(tail) if !head.is_empty() && !head.eq_ignore_ascii_case(&tail) => {
                format!("{head}, {tail}")
            },
            Some(tail) => tail,
            None => head,
        }
    }
}

impl fmt::Display for GeographicElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
