//! Tolerant extraction from Cercalia response trees
//!
//! The same logical field can arrive as an attribute (`"@name"`), a value
//! wrapper (`{"name": {"value": ...}}`) or plain text (`{"name": ...}`), and
//! lists of one element collapse to a bare object. Every field is read
//! through an ordered list of [`Extract`] strategies so the tolerated shapes
//! are visible in one place and testable on their own.

use domain::{AdminEntity, Coordinate};
use serde_json::Value;

use crate::models::{GeoElementKind, GeographicElement};

/// One way of locating a scalar field on a response node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// `node["@name"]`
    Attr(&'static str),
    /// `node[name]["value"]` or `node[name]["@value"]`
    Wrapped(&'static str),
    /// `node[name]` holding a scalar
    Text(&'static str),
    /// Nested walk; the final node may be a scalar or a value wrapper
    Path(&'static [&'static str]),
}

impl Extract {
    /// Apply this strategy to a node
    #[must_use]
    pub fn apply(&self, node: &Value) -> Option<String> {
        match *self {
            Self::Attr(name) => node.get(format!("@{name}").as_str()).and_then(scalar),
            Self::Wrapped(name) => node.get(name).and_then(unwrap_value),
            Self::Text(name) => node.get(name).and_then(scalar),
            Self::Path(keys) => {
                let mut current = node;
                for key in keys {
                    current = current.get(*key)?;
                }
                scalar(current).or_else(|| unwrap_value(current))
            },
        }
    }
}

/// Render a scalar node as a trimmed, non-empty string
fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn unwrap_value(value: &Value) -> Option<String> {
    value
        .get("value")
        .and_then(scalar)
        .or_else(|| value.get("@value").and_then(scalar))
}

/// First non-empty result of the strategies, in order
#[must_use]
pub fn extract_str(node: &Value, strategies: &[Extract]) -> Option<String> {
    strategies.iter().find_map(|s| s.apply(node))
}

/// Like [`extract_str`], parsed as a float
#[must_use]
pub fn extract_f64(node: &Value, strategies: &[Extract]) -> Option<f64> {
    strategies
        .iter()
        .filter_map(|s| s.apply(node))
        .find_map(|text| text.parse().ok())
}

/// Like [`extract_str`], parsed as an unsigned integer
///
/// Accepts decimal notation (`"12.0"`) and truncates it.
#[must_use]
pub fn extract_u64(node: &Value, strategies: &[Extract]) -> Option<u64> {
    strategies
        .iter()
        .filter_map(|s| s.apply(node))
        .find_map(|text| parse_u64(&text))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_u64(text: &str) -> Option<u64> {
    text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

/// Like [`extract_str`], parsed as a boolean (`true/false`, `1/0`, `yes/no`)
#[must_use]
pub fn extract_bool(node: &Value, strategies: &[Extract]) -> Option<bool> {
    strategies
        .iter()
        .filter_map(|s| s.apply(node))
        .find_map(|text| match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Some(true),
            "false" | "0" | "no" | "n" => Some(false),
            _ => None,
        })
}

/// Items of a list node; a bare object counts as a one-item list
#[must_use]
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// Walk `path` from `node`; the last step may be a list or a single object
///
/// If an intermediate step is a list, its first element is followed.
#[must_use]
pub fn list_at<'a>(node: &'a Value, path: &[&str]) -> Vec<&'a Value> {
    let mut current = node;
    for key in path {
        let next = match current {
            Value::Array(items) => items.first().and_then(|item| item.get(*key)),
            other => other.get(*key),
        };
        match next {
            Some(value) => current = value,
            None => return Vec::new(),
        }
    }
    as_list(Some(current))
}

/// First container present among several possible paths
#[must_use]
pub fn first_list<'a>(node: &'a Value, paths: &[&[&str]]) -> Vec<&'a Value> {
    paths
        .iter()
        .map(|path| list_at(node, path))
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

const COORD_X: &[Extract] = &[
    Extract::Path(&["coord", "@x"]),
    Extract::Path(&["coord", "x"]),
    Extract::Attr("x"),
    Extract::Text("x"),
];

const COORD_Y: &[Extract] = &[
    Extract::Path(&["coord", "@y"]),
    Extract::Path(&["coord", "y"]),
    Extract::Attr("y"),
    Extract::Text("y"),
];

/// Coordinate of a node (x = longitude, y = latitude)
#[must_use]
pub fn extract_coordinate(node: &Value) -> Option<Coordinate> {
    let x = extract_f64(node, COORD_X)?;
    let y = extract_f64(node, COORD_Y)?;
    Some(Coordinate::new(y, x))
}

const ADMIN_CODE: &[Extract] = &[
    Extract::Attr("id"),
    Extract::Text("id"),
    Extract::Attr("code"),
    Extract::Text("code"),
];

const ADMIN_NAME: &[Extract] = &[
    Extract::Text("value"),
    Extract::Attr("value"),
    Extract::Attr("name"),
    Extract::Text("name"),
    Extract::Wrapped("name"),
];

/// Administrative entity stored under the first present container name
///
/// Recognized shapes, per container `n`:
/// - object: `{"@id": .., "value": ..}` (also `id`/`code`, `@name`/`name`)
/// - scalar: `{"n": "Barcelona"}`, code from `@nid`/`@n_id` siblings
/// - flat attributes: `{"@n": "Barcelona", "@nid": "08019"}`
///
/// The code always comes from the same node as the name.
#[must_use]
pub fn extract_admin(node: &Value, names: &[&str]) -> Option<AdminEntity> {
    names.iter().find_map(|name| admin_from(node, name))
}

fn admin_from(node: &Value, name: &str) -> Option<AdminEntity> {
    let sibling_code = || {
        node.get(format!("@{name}id").as_str())
            .and_then(scalar)
            .or_else(|| node.get(format!("@{name}_id").as_str()).and_then(scalar))
    };

    match node.get(name) {
        Some(child @ Value::Object(_)) => {
            let entity_name = extract_str(child, ADMIN_NAME)?;
            Some(AdminEntity {
                code: extract_str(child, ADMIN_CODE),
                name: entity_name,
            })
        },
        Some(child) => scalar(child).map(|entity_name| AdminEntity {
            code: sibling_code(),
            name: entity_name,
        }),
        None => node
            .get(format!("@{name}").as_str())
            .and_then(scalar)
            .map(|entity_name| AdminEntity {
                code: sibling_code(),
                name: entity_name,
            }),
    }
}

const GE_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];

const GE_NAME: &[Extract] = &[
    Extract::Attr("name"),
    Extract::Wrapped("name"),
    Extract::Text("name"),
    Extract::Attr("desc"),
];

const GE_TYPE: &[Extract] = &[Extract::Attr("type"), Extract::Text("type")];

const GE_HOUSE_NUMBER: &[Extract] = &[
    Extract::Wrapped("housenumber"),
    Extract::Attr("housenumber"),
    Extract::Text("housenumber"),
    Extract::Attr("hn"),
];

const GE_POSTAL_CODE: &[Extract] = &[
    Extract::Path(&["postalcode", "@id"]),
    Extract::Wrapped("postalcode"),
    Extract::Text("postalcode"),
    Extract::Attr("pcode"),
];

/// Parse a `ge` (geographic element) node
#[must_use]
pub fn parse_geographic_element(node: &Value) -> GeographicElement {
    let id = extract_str(node, GE_ID);
    let kind = classify_kind(extract_str(node, GE_TYPE).as_deref(), id.as_deref());

    GeographicElement {
        name: extract_str(node, GE_NAME),
        kind,
        house_number: extract_str(node, GE_HOUSE_NUMBER),
        postal_code: extract_str(node, GE_POSTAL_CODE),
        street: extract_admin(node, &["street", "st"]),
        locality: extract_admin(node, &["city", "ct", "locality"]),
        municipality: extract_admin(node, &["municipality", "mun"]),
        subregion: extract_admin(node, &["subregion", "subreg"]),
        region: extract_admin(node, &["region", "reg"]),
        country: extract_admin(node, &["country", "cty", "ctry"]),
        coordinate: extract_coordinate(node),
        id,
    }
}

/// Kind of a geographic element
///
/// Without an explicit type, an id of exactly three uppercase ASCII letters
/// is read as a country-only result (`"ESP"`, `"FRA"`). This is a
/// provisional heuristic for responses that do not say what they are.
#[must_use]
pub fn classify_kind(type_code: Option<&str>, id: Option<&str>) -> GeoElementKind {
    if let Some(code) = type_code {
        return GeoElementKind::from_code(code);
    }

    match id {
        Some(id) if id.len() == 3 && id.bytes().all(|b| b.is_ascii_uppercase()) => {
            GeoElementKind::Country
        },
        _ => GeoElementKind::Unknown,
    }
}
