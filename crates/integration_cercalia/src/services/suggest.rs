//! Address autocomplete on the suggest endpoint
//!
//! Unlike the services endpoint, responses here are plain JSON documents
//! without the `cercalia` envelope.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::non_empty;
use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{
    HouseNumbers, SuggestGeocodeOptions, SuggestGeocodeResult, SuggestOptions, Suggestion,
};
use crate::response::{
    Extract, as_list, extract_admin, extract_bool, extract_coordinate, extract_f64, extract_str,
    extract_u64, first_list,
};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const SUGGEST_PATH: &str = "SuggestServlet";
const GEOCODE_PATH: &str = "SuggestGeocodeServlet";

const ID: &[Extract] = &[Extract::Text("id"), Extract::Attr("id")];
const KIND: &[Extract] = &[Extract::Text("type"), Extract::Attr("type")];
const DESCRIPTION: &[Extract] = &[Extract::Text("desc"), Extract::Text("description")];
const SCORE: &[Extract] = &[Extract::Text("score"), Extract::Attr("score")];
const STREET_DESCRIPTION: &[Extract] = &[Extract::Path(&["street", "description"])];
const POSTAL_CODE: &[Extract] = &[
    Extract::Path(&["postal_code", "code"]),
    Extract::Text("postal_code"),
    Extract::Text("postalcode"),
];
const NAME: &[Extract] = &[Extract::Text("name"), Extract::Attr("name")];
const HOUSE_NUMBER: &[Extract] = &[
    Extract::Text("housenumber"),
    Extract::Text("house_number"),
    Extract::Attr("housenumber"),
];

/// Suggest service
#[derive(Clone)]
pub struct SuggestService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for SuggestService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestService").finish_non_exhaustive()
    }
}

impl SuggestService {
    /// Create a new suggest service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Suggestions for partially typed text
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank text.
    #[instrument(skip(self))]
    pub async fn suggest(&self, options: &SuggestOptions) -> Result<Vec<Suggestion>> {
        let params = build_suggest_params(options)?;
        let request = CercaliaRequest::suggest("suggest", SUGGEST_PATH, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let suggestions = parse_suggestions(&root);
        debug!(count = suggestions.len(), "Suggestions received");
        Ok(suggestions)
    }

    /// Resolve a chosen suggestion to a position
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` without a city or street code and `NotFound`
    /// when the response carries no position.
    #[instrument(skip(self))]
    pub async fn geocode(&self, options: &SuggestGeocodeOptions) -> Result<SuggestGeocodeResult> {
        let params = build_suggest_geocode_params(options)?;
        let request = CercaliaRequest::suggest("suggest_geocode", GEOCODE_PATH, params);
        let root = self.transport.execute(&request).await?;
        parse_suggest_geocode(&root)
    }
}

/// Map suggest options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` for blank text.
pub fn build_suggest_params(options: &SuggestOptions) -> Result<QueryParams> {
    let text = non_empty(Some(options.text.as_str())).ok_or_else(|| {
        CercaliaError::InvalidInput("suggest text must not be empty".to_string())
    })?;

    let kinds: Vec<&str> = options.kinds.iter().map(|k| k.as_param()).collect();

    let mut params = QueryParams::new();
    params
        .push("t", text)
        .push_opt("ctc", non_empty(options.country_code.as_deref()))
        .push_opt("num", options.limit)
        .push_opt("pt", options.center.map(|c| c.to_lat_lng()));
    if !kinds.is_empty() {
        params.push("type", kinds.join(","));
    }
    Ok(params)
}

/// Map suggest geocode options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` without a city or street code.
pub fn build_suggest_geocode_params(options: &SuggestGeocodeOptions) -> Result<QueryParams> {
    let city = non_empty(options.city_code.as_deref());
    let street = non_empty(options.street_code.as_deref());
    if city.is_none() && street.is_none() {
        return Err(CercaliaError::InvalidInput(
            "a city code or street code is required".to_string(),
        ));
    }

    let mut params = QueryParams::new();
    params
        .push_opt("ctid", city)
        .push_opt("stid", street)
        .push_opt("pcode", non_empty(options.postal_code.as_deref()))
        .push_opt("nr", non_empty(options.house_number.as_deref()))
        .push_opt("ctc", non_empty(options.country_code.as_deref()));
    Ok(params)
}

fn parse_house_numbers(node: &Value) -> HouseNumbers {
    let u32_at = |key: &[Extract]| {
        extract_u64(node, key).and_then(|v| u32::try_from(v).ok())
    };
    HouseNumbers {
        available: extract_bool(node, &[Extract::Text("available")]).unwrap_or(false),
        min: u32_at(&[Extract::Text("min")]),
        max: u32_at(&[Extract::Text("max")]),
        current: u32_at(&[Extract::Text("current")]),
        hint: extract_str(node, &[Extract::Text("hint")]),
    }
}

fn parse_suggestion(node: &Value) -> Option<Suggestion> {
    let street = extract_admin(node, &["street"]);
    let locality = extract_admin(node, &["city", "locality"]);

    let description = extract_str(node, DESCRIPTION).or_else(|| {
        match (&street, &locality) {
            (Some(street), Some(city)) => Some(format!("{}, {}", street.name, city.name)),
            (Some(only), None) | (None, Some(only)) => Some(only.name.clone()),
            (None, None) => None,
        }
    });
    let Some(description) = description else {
        warn!(id = ?extract_str(node, ID), "Skipping suggestion without text");
        return None;
    };

    Some(Suggestion {
        id: extract_str(node, ID),
        kind: extract_str(node, KIND),
        description,
        score: extract_f64(node, SCORE),
        street_description: extract_str(node, STREET_DESCRIPTION),
        street,
        locality,
        municipality: extract_admin(node, &["municipality"]),
        subregion: extract_admin(node, &["subregion"]),
        region: extract_admin(node, &["region"]),
        country: extract_admin(node, &["country"]),
        postal_code: extract_str(node, POSTAL_CODE),
        house_numbers: node.get("house_numbers").map(parse_house_numbers),
        coordinate: extract_coordinate(node),
    })
}

/// Parse `suggestions[]` or a Solr `response.docs[]`
#[must_use]
pub fn parse_suggestions(root: &Value) -> Vec<Suggestion> {
    first_list(root, &[&["suggestions"], &["response", "docs"]])
        .into_iter()
        .filter_map(parse_suggestion)
        .collect()
}

/// Parse the `res` node of a suggest geocode response
///
/// # Errors
///
/// Returns `NotFound` without `res` or without a position.
pub fn parse_suggest_geocode(root: &Value) -> Result<SuggestGeocodeResult> {
    let results = as_list(root.get("res"));
    let res = results
        .first()
        .ok_or_else(|| CercaliaError::NotFound("no suggest geocode result".to_string()))?;
    let coordinate = extract_coordinate(res).ok_or_else(|| {
        CercaliaError::NotFound("suggest geocode result without position".to_string())
    })?;

    Ok(SuggestGeocodeResult {
        coordinate,
        name: extract_str(res, NAME),
        house_number: extract_str(res, HOUSE_NUMBER),
        postal_code: extract_str(res, POSTAL_CODE),
        street: extract_admin(res, &["street"]),
        locality: extract_admin(res, &["city", "locality"]),
        municipality: extract_admin(res, &["municipality"]),
        subregion: extract_admin(res, &["subregion"]),
        region: extract_admin(res, &["region"]),
        country: extract_admin(res, &["country"]),
    })
}
