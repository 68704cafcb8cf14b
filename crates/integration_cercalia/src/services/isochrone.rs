//! Reachable areas (`cmd=isochrone`)

use std::fmt;
use std::sync::Arc;

use domain::Coordinate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{CercaliaError, Result};
use crate::models::{Isochrone, IsochroneOptions, IsochroneWeight};
use crate::response::{Extract, extract_str, extract_u64, list_at};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "isochrone";

const LEVEL: &[Extract] = &[
    Extract::Attr("level"),
    Extract::Attr("value"),
    Extract::Text("level"),
];

const WKT: &[Extract] = &[
    Extract::Text("value"),
    Extract::Path(&["wkt", "value"]),
    Extract::Attr("wkt"),
    Extract::Text("wkt"),
];

/// Isochrone service
#[derive(Clone)]
pub struct IsochroneService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for IsochroneService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsochroneService").finish_non_exhaustive()
    }
}

impl IsochroneService {
    /// Create a new isochrone service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Area reachable from `center` within `value` minutes or meters
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero value and `NotFound` when the
    /// response holds no usable polygon.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        center: Coordinate,
        value: u64,
        options: &IsochroneOptions,
    ) -> Result<Isochrone> {
        self.calculate_many(center, &[value], options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CercaliaError::NotFound("no isochrone in response".to_string()))
    }

    /// One area per value, from a single request
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty list or a zero value and
    /// `NotFound` when the response holds no usable polygon.
    #[instrument(skip(self))]
    pub async fn calculate_many(
        &self,
        center: Coordinate,
        values: &[u64],
        options: &IsochroneOptions,
    ) -> Result<Vec<Isochrone>> {
        let params = build_isochrone_params(center, values, options)?;
        let request = CercaliaRequest::services("isochrone", CMD, params);
        let root = self.transport.execute(&request).await?;

        let isochrones = parse_isochrones(&root, center, options.weight);
        if isochrones.is_empty() {
            return Err(CercaliaError::NotFound(
                "no isochrone in response".to_string(),
            ));
        }

        debug!(count = isochrones.len(), "Isochrones calculated");
        Ok(isochrones)
    }
}

/// Map isochrone options to vendor parameters
///
/// Time values are minutes and go out as milliseconds; distances are meters.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty list or a zero value.
pub fn build_isochrone_params(
    center: Coordinate,
    values: &[u64],
    options: &IsochroneOptions,
) -> Result<QueryParams> {
    if values.is_empty() {
        return Err(CercaliaError::InvalidInput(
            "at least one isochrone value is required".to_string(),
        ));
    }
    if values.contains(&0) {
        return Err(CercaliaError::InvalidInput(
            "isochrone values must be greater than 0".to_string(),
        ));
    }

    let levels: Vec<String> = values
        .iter()
        .map(|v| options.weight.to_vendor(*v).to_string())
        .collect();

    let mut params = QueryParams::new();
    params
        .push("mo", center.to_lat_lng())
        .push("weight", options.weight.as_param())
        .push("isolevels", levels.join(","))
        .push_opt("method", options.method.map(|m| m.as_param()));
    Ok(params)
}

/// Parse `isochrones.isochrone`; records without WKT are skipped
#[must_use]
pub fn parse_isochrones(root: &Value, center: Coordinate, weight: IsochroneWeight) -> Vec<Isochrone> {
    list_at(root, &["isochrones", "isochrone"])
        .into_iter()
        .filter_map(|node| {
            let level = extract_u64(node, LEVEL);
            let Some(wkt) = extract_str(node, WKT) else {
                warn!(?level, "Skipping isochrone without geometry");
                return None;
            };
            let level = level.unwrap_or_default();
            Some(Isochrone {
                center,
                value: weight.from_vendor(level),
                level,
                weight,
                wkt,
            })
        })
        .collect()
}
