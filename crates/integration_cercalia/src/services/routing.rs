//! Route calculation (`cmd=route`)

use std::fmt;
use std::sync::Arc;

use domain::Coordinate;
use serde_json::Value;
use tracing::{debug, instrument};

use super::km_to_m;
use crate::error::{CercaliaError, Result};
use crate::models::{DimensionLimit, RouteOptions, RouteResult, RouteWeight, TruckProfile};
use crate::response::{Extract, extract_f64, extract_str, extract_u64, list_at};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "route";

const ROUTE_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];
const ROUTE_DIST: &[Extract] = &[Extract::Attr("dist"), Extract::Text("dist")];
const ROUTE_TIME: &[Extract] = &[Extract::Attr("time"), Extract::Text("time")];
const ROUTE_DURATION: &[Extract] = &[Extract::Attr("duration"), Extract::Text("duration")];
const ROUTE_WKT: &[Extract] = &[
    Extract::Wrapped("wkt"),
    Extract::Text("wkt"),
    Extract::Attr("wkt"),
];

const KG_PER_TONNE: f64 = 1000.0;
const CM_PER_METER: f64 = 100.0;

/// Routing service
#[derive(Clone)]
pub struct RoutingService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for RoutingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingService").finish_non_exhaustive()
    }
}

impl RoutingService {
    /// Create a new routing service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Calculate a route from origin to destination
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the response carries no route, `InvalidInput`
    /// for a non-positive truck dimension, or any transport or vendor error
    /// (including the "no results" sentinel).
    #[instrument(skip(self, options))]
    pub async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
    ) -> Result<RouteResult> {
        let params = build_route_params(origin, destination, options)?;
        let request = CercaliaRequest::services("route", CMD, params);
        let root = self.transport.execute(&request).await?;
        let route = parse_route(&root, options.weight)?;

        debug!(
            distance_m = route.distance_m,
            duration_secs = route.duration_secs,
            "Route calculated"
        );
        Ok(route)
    }
}

/// Map route options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive truck dimension.
pub fn build_route_params(
    origin: Coordinate,
    destination: Coordinate,
    options: &RouteOptions,
) -> Result<QueryParams> {
    let mut params = QueryParams::new();
    params
        .push("mo_o", origin.to_lat_lng())
        .push("mo_d", destination.to_lat_lng());
    for (i, waypoint) in options.waypoints.iter().enumerate() {
        params.push(format!("mo_{}", i + 1), waypoint.to_lat_lng());
    }
    params.push("weight", options.weight.as_param());

    if options.avoid_tolls {
        params.push("avoidtolls", "true");
    }
    if options.include_geometry {
        params.push("geometry", "wkt");
    }
    if let Some(truck) = &options.truck {
        push_truck(&mut params, truck)?;
    }

    Ok(params)
}

fn push_truck(params: &mut QueryParams, truck: &TruckProfile) -> Result<()> {
    params.push("vehtype", "truck");

    let dimensions = [
        ("weight", truck.weight_kg, KG_PER_TONNE),
        ("axleweight", truck.axle_weight_kg, KG_PER_TONNE),
        ("height", truck.height_cm, CM_PER_METER),
        ("width", truck.width_cm, CM_PER_METER),
        ("length", truck.length_cm, CM_PER_METER),
    ];

    for (name, limit, divisor) in dimensions {
        let Some(DimensionLimit { value, block, avoid }) = limit else {
            continue;
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(CercaliaError::InvalidInput(format!(
                "truck {name} must be positive, got {value}"
            )));
        }

        params.push(format!("v{name}"), (value / divisor).to_string());
        if block {
            params.push(format!("blockv{name}"), "true");
        }
        // Avoid is the default when no flag was chosen
        if avoid || !block {
            params.push(format!("avoidv{name}"), "true");
        }
    }

    Ok(())
}

/// Parse a `D:HH:MM:SS` or `HH:MM:SS` duration into seconds
#[must_use]
pub fn parse_duration(text: &str) -> Option<u64> {
    let parts: Vec<u64> = text
        .trim()
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;

    let (d, h, m, s) = match parts.as_slice() {
        [d, h, m, s] => (*d, *h, *m, *s),
        [h, m, s] => (0, *h, *m, *s),
        _ => return None,
    };

    d.checked_mul(86_400)?
        .checked_add(h.checked_mul(3600)?)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parse the `route` node
///
/// # Errors
///
/// Returns `NotFound` without a route node and `ParseError` when distance or
/// duration are missing.
pub fn parse_route(root: &Value, weight: RouteWeight) -> Result<RouteResult> {
    let routes = list_at(root, &["route"]);
    let route = routes
        .first()
        .ok_or_else(|| CercaliaError::NotFound("no route in response".to_string()))?;

    let distance_km = extract_f64(route, ROUTE_DIST)
        .ok_or_else(|| CercaliaError::ParseError("route without distance".to_string()))?;

    let duration_secs = extract_u64(route, ROUTE_TIME)
        .or_else(|| extract_str(route, ROUTE_DURATION).and_then(|d| parse_duration(&d)))
        .ok_or_else(|| CercaliaError::ParseError("route without duration".to_string()))?;

    Ok(RouteResult {
        id: extract_str(route, ROUTE_ID),
        distance_m: km_to_m(distance_km),
        duration_secs,
        geometry_wkt: extract_str(route, ROUTE_WKT),
        weight,
    })
}
