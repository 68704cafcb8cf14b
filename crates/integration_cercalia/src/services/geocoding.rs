//! Address and place geocoding (`cmd=cand`)

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::non_empty;
use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{
    DEFAULT_COUNTRY_CODE, GeoElementKind, GeocodingCandidate, GeocodingOptions,
};
use crate::response::{
    Extract, classify_kind, extract_coordinate, extract_f64, extract_str, list_at,
    parse_geographic_element,
};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "cand";

const CANDIDATE_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];
const CANDIDATE_NAME: &[Extract] = &[Extract::Attr("name"), Extract::Text("name")];
const CANDIDATE_DESC: &[Extract] = &[Extract::Attr("desc"), Extract::Text("desc")];
const CANDIDATE_TYPE: &[Extract] = &[Extract::Attr("type"), Extract::Text("type")];
const CANDIDATE_SCORE: &[Extract] = &[
    Extract::Attr("sc"),
    Extract::Attr("score"),
    Extract::Text("score"),
];

/// Geocoding service
#[derive(Clone)]
pub struct GeocodingService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for GeocodingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodingService").finish_non_exhaustive()
    }
}

impl GeocodingService {
    /// Create a new geocoding service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Geocode a structured address
    ///
    /// An empty match is returned as an empty list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when no location field is set, or any
    /// transport or vendor error.
    #[instrument(skip(self))]
    pub async fn geocode(&self, options: &GeocodingOptions) -> Result<Vec<GeocodingCandidate>> {
        let params = build_geocode_params(options)?;
        self.candidates("geocode", params).await
    }

    /// Geocode a kilometer point on a road, e.g. `("A-7", 1000.0)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank road name or negative kilometer.
    #[instrument(skip(self))]
    pub async fn geocode_road_milestone(
        &self,
        road: &str,
        km: f64,
        subregion: Option<&str>,
        country_code: Option<&str>,
    ) -> Result<Vec<GeocodingCandidate>> {
        let params = build_milestone_params(road, km, subregion, country_code)?;
        self.candidates("geocode_road_milestone", params).await
    }

    /// Localities sharing a postal code
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank postal code.
    #[instrument(skip(self))]
    pub async fn cities_by_postal_code(
        &self,
        postal_code: &str,
        country_code: Option<&str>,
    ) -> Result<Vec<GeocodingCandidate>> {
        let params = build_postal_code_params(postal_code, country_code)?;
        let mut candidates = self.candidates("cities_by_postal_code", params).await?;
        candidates.retain(|c| {
            matches!(c.element.kind, GeoElementKind::Locality | GeoElementKind::Unknown)
        });
        Ok(candidates)
    }

    async fn candidates(
        &self,
        operation: &'static str,
        params: QueryParams,
    ) -> Result<Vec<GeocodingCandidate>> {
        let request = CercaliaRequest::services(operation, CMD, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let candidates = parse_candidates(&root);
        debug!(count = candidates.len(), "Geocoding completed");
        Ok(candidates)
    }
}

fn country_or_default(country_code: Option<&str>) -> &str {
    non_empty(country_code).unwrap_or(DEFAULT_COUNTRY_CODE)
}

/// Map geocoding options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` when no location field is set.
pub fn build_geocode_params(options: &GeocodingOptions) -> Result<QueryParams> {
    let street = non_empty(options.street.as_deref());
    let postal_code = non_empty(options.postal_code.as_deref());
    let locality = non_empty(options.locality.as_deref());
    let municipality = non_empty(options.municipality.as_deref());
    let subregion = non_empty(options.subregion.as_deref());
    let region = non_empty(options.region.as_deref());

    if [street, postal_code, locality, municipality, subregion, region]
        .iter()
        .all(Option::is_none)
    {
        return Err(CercaliaError::InvalidInput(
            "geocoding needs a street, postal code, locality, municipality, subregion or region"
                .to_string(),
        ));
    }

    let address = street.map(|s| match non_empty(options.house_number.as_deref()) {
        Some(number) => format!("{s} {number}"),
        None => s.to_string(),
    });

    let mut params = QueryParams::new();
    params
        .push_opt("adr", address)
        .push_opt("pcode", postal_code)
        .push_opt("ctn", locality)
        .push_opt("mun", municipality)
        .push_opt("subreg", subregion)
        .push_opt("reg", region)
        .push("ctc", country_or_default(Some(options.country_code.as_str())))
        .push_opt("num", options.limit);
    if options.full_search {
        params.push("fullsearch", "true");
    }
    Ok(params)
}

/// Parameters of a road milestone lookup
///
/// # Errors
///
/// Returns `InvalidInput` for a blank road or a negative kilometer.
pub fn build_milestone_params(
    road: &str,
    km: f64,
    subregion: Option<&str>,
    country_code: Option<&str>,
) -> Result<QueryParams> {
    let road = non_empty(Some(road))
        .ok_or_else(|| CercaliaError::InvalidInput("road name must not be empty".to_string()))?;
    if !km.is_finite() || km < 0.0 {
        return Err(CercaliaError::InvalidInput(format!(
            "kilometer point must be zero or positive, got {km}"
        )));
    }

    let mut params = QueryParams::new();
    params
        .push("rdn", road)
        .push("km", km.to_string())
        .push_opt("subreg", non_empty(subregion))
        .push("ctc", country_or_default(country_code));
    Ok(params)
}

/// Parameters of a postal code lookup
///
/// # Errors
///
/// Returns `InvalidInput` for a blank postal code.
pub fn build_postal_code_params(
    postal_code: &str,
    country_code: Option<&str>,
) -> Result<QueryParams> {
    let postal_code = non_empty(Some(postal_code))
        .ok_or_else(|| CercaliaError::InvalidInput("postal code must not be empty".to_string()))?;

    let mut params = QueryParams::new();
    params
        .push("pcode", postal_code)
        .push("ctc", country_or_default(country_code))
        .push("lvl", "ct");
    Ok(params)
}

/// Parse `candidates.candidate`; candidates without coordinates are skipped
#[must_use]
pub fn parse_candidates(root: &Value) -> Vec<GeocodingCandidate> {
    list_at(root, &["candidates", "candidate"])
        .into_iter()
        .filter_map(parse_candidate)
        .collect()
}

fn parse_candidate(node: &Value) -> Option<GeocodingCandidate> {
    let ge = match node.get("ge") {
        Some(Value::Array(items)) => items.first().unwrap_or(node),
        Some(ge) => ge,
        None => node,
    };

    let mut element = parse_geographic_element(ge);
    let candidate_id = extract_str(node, CANDIDATE_ID);
    if element.id.is_none() {
        element.id.clone_from(&candidate_id);
    }
    if element.name.is_none() {
        element.name = extract_str(node, CANDIDATE_NAME);
    }
    if element.kind == GeoElementKind::Unknown {
        element.kind = classify_kind(
            extract_str(node, CANDIDATE_TYPE).as_deref(),
            element.id.as_deref(),
        );
    }

    let Some(coordinate) = element.coordinate.or_else(|| extract_coordinate(node)) else {
        warn!(id = ?candidate_id, "Skipping geocoding candidate without coordinates");
        return None;
    };
    element.coordinate = Some(coordinate);

    let label = extract_str(node, CANDIDATE_DESC).unwrap_or_else(|| element.label());

    Some(GeocodingCandidate {
        score: extract_f64(node, CANDIDATE_SCORE),
        coordinate,
        label,
        element,
    })
}
