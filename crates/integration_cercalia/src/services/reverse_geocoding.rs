//! Reverse geocoding (`cmd=prox` with `rqge`)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use domain::Coordinate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{
    BatchReverseGeocode, MAX_BATCH_SIZE, ReverseGeocodeLevel, ReverseGeocodeResult, TimezoneInfo,
};
use crate::response::{
    Extract, as_list, extract_f64, extract_str, extract_u64, first_list, list_at,
    parse_geographic_element,
};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "prox";

const GE_DISTANCE: &[Extract] = &[Extract::Attr("dist"), Extract::Text("dist")];
const MO_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];
const GE_MO_ID: &[Extract] = &[Extract::Attr("mo_id"), Extract::Text("mo_id")];

const TZ_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];
const TZ_NAME: &[Extract] = &[Extract::Attr("name"), Extract::Text("name")];
const TZ_LOCAL: &[Extract] = &[Extract::Attr("localdatetime"), Extract::Text("localdatetime")];
const TZ_UTC: &[Extract] = &[Extract::Attr("utcdatetime"), Extract::Text("utcdatetime")];
const TZ_OFFSET: &[Extract] = &[Extract::Attr("utcoffset"), Extract::Text("utcoffset")];
const TZ_DST: &[Extract] = &[
    Extract::Attr("daylightsavingtime"),
    Extract::Text("daylightsavingtime"),
];

/// Reverse geocoding service
#[derive(Clone)]
pub struct ReverseGeocodingService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for ReverseGeocodingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseGeocodingService").finish_non_exhaustive()
    }
}

impl ReverseGeocodingService {
    /// Create a new reverse geocoding service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Resolve a coordinate to the nearest place of the given level
    ///
    /// Returns `None` when the vendor finds nothing.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
        level: ReverseGeocodeLevel,
    ) -> Result<Option<ReverseGeocodeResult>> {
        let request = CercaliaRequest::services(
            "reverse_geocode",
            CMD,
            build_reverse_params(coordinate, level),
        );
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        Ok(parse_reverse(&root))
    }

    /// Resolve up to [`MAX_BATCH_SIZE`] coordinates in one request
    ///
    /// The result has one entry per input coordinate, in input order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for more than [`MAX_BATCH_SIZE`] coordinates.
    #[instrument(skip(self, coordinates), fields(count = coordinates.len()))]
    pub async fn reverse_geocode_batch(
        &self,
        coordinates: &[Coordinate],
        level: ReverseGeocodeLevel,
    ) -> Result<Vec<BatchReverseGeocode>> {
        if coordinates.is_empty() {
            return Ok(Vec::new());
        }

        let params = build_batch_params(coordinates, level)?;
        let request = CercaliaRequest::services("reverse_geocode_batch", CMD, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let results = parse_batch(&root, coordinates);
        debug!(
            resolved = results.iter().filter(|r| r.result.is_some()).count(),
            "Batch reverse geocoding completed"
        );
        Ok(results)
    }

    /// Time zone at a coordinate, optionally at a given instant
    #[instrument(skip(self))]
    pub async fn timezone(
        &self,
        coordinate: Coordinate,
        at: Option<DateTime<Utc>>,
    ) -> Result<Option<TimezoneInfo>> {
        let request =
            CercaliaRequest::services("timezone", CMD, build_timezone_params(coordinate, at));
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        Ok(parse_timezone(&root))
    }
}

/// Parameters of a single reverse geocoding call
#[must_use]
pub fn build_reverse_params(coordinate: Coordinate, level: ReverseGeocodeLevel) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .push("mo", coordinate.to_lat_lng())
        .push("rqge", level.as_param());
    params
}

/// Parameters of a batch call: `molist=[lat,lng|1],[lat,lng|2],...`
///
/// # Errors
///
/// Returns `InvalidInput` for an empty list or more than [`MAX_BATCH_SIZE`]
/// coordinates.
pub fn build_batch_params(
    coordinates: &[Coordinate],
    level: ReverseGeocodeLevel,
) -> Result<QueryParams> {
    if coordinates.is_empty() || coordinates.len() > MAX_BATCH_SIZE {
        return Err(CercaliaError::InvalidInput(format!(
            "batch reverse geocoding takes 1 to {MAX_BATCH_SIZE} coordinates, got {}",
            coordinates.len()
        )));
    }

    let molist: Vec<String> = coordinates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}|{}]", c.to_lat_lng(), i + 1))
        .collect();

    let mut params = QueryParams::new();
    params
        .push("molist", molist.join(","))
        .push("rqge", level.as_param());
    Ok(params)
}

/// Parameters of a time zone lookup
#[must_use]
pub fn build_timezone_params(coordinate: Coordinate, at: Option<DateTime<Utc>>) -> QueryParams {
    let mut params = build_reverse_params(coordinate, ReverseGeocodeLevel::Timezone);
    params.push_opt(
        "datetime",
        at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    params
}

fn parse_ge(ge: &Value) -> ReverseGeocodeResult {
    ReverseGeocodeResult {
        element: parse_geographic_element(ge),
        distance_m: extract_f64(ge, GE_DISTANCE),
    }
}

/// First element of `proximity.gelist.ge`
#[must_use]
pub fn parse_reverse(root: &Value) -> Option<ReverseGeocodeResult> {
    list_at(root, &["proximity", "gelist", "ge"])
        .into_iter()
        .next()
        .map(parse_ge)
}

/// Match a batch response back to its input coordinates
///
/// Reads `proximity.molist.mo[]` keyed by `@id`, falling back to
/// `proximity.gelist.ge[]` keyed by `@mo_id` or list position.
#[must_use]
pub fn parse_batch(root: &Value, coordinates: &[Coordinate]) -> Vec<BatchReverseGeocode> {
    let mut by_id: HashMap<u64, ReverseGeocodeResult> = HashMap::new();

    let mos = list_at(root, &["proximity", "molist", "mo"]);
    if mos.is_empty() {
        for (ge, position) in list_at(root, &["proximity", "gelist", "ge"])
            .into_iter()
            .zip(1u64..)
        {
            let id = extract_u64(ge, GE_MO_ID).unwrap_or(position);
            by_id.insert(id, parse_ge(ge));
        }
    } else {
        for mo in mos {
            let Some(id) = extract_u64(mo, MO_ID) else {
                warn!("Skipping batch entry without id");
                continue;
            };
            if let Some(ge) = as_list(mo.get("ge")).first() {
                by_id.insert(id, parse_ge(ge));
            }
        }
    }

    coordinates
        .iter()
        .zip(1u64..)
        .map(|(coordinate, id)| BatchReverseGeocode {
            coordinate: *coordinate,
            result: by_id.remove(&id),
        })
        .collect()
}

fn extract_i64(node: &Value, strategies: &[Extract]) -> Option<i64> {
    extract_str(node, strategies).and_then(|text| text.parse().ok())
}

/// Time zone node under `proximity`, the first `ge`, or the root
#[must_use]
pub fn parse_timezone(root: &Value) -> Option<TimezoneInfo> {
    let nodes = first_list(
        root,
        &[
            &["proximity", "timezone"],
            &["proximity", "gelist", "ge", "timezone"],
            &["timezone"],
        ],
    );
    let node = nodes.first()?;

    let Some(id) = extract_str(node, TZ_ID) else {
        warn!("Time zone without id in response");
        return None;
    };

    Some(TimezoneInfo {
        id,
        name: extract_str(node, TZ_NAME),
        local_time: extract_str(node, TZ_LOCAL)
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok()),
        utc_time: extract_str(node, TZ_UTC)
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc)),
        utc_offset_ms: extract_i64(node, TZ_OFFSET).unwrap_or(0),
        daylight_saving_ms: extract_i64(node, TZ_DST).unwrap_or(0),
    })
}
