//! Point-in-shape tests (`cmd=geofencing`)

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{non_empty, polygon_wkt};
use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{GeofenceGeometry, GeofenceMatch, GeofencePoint, GeofenceShape};
use crate::response::{Extract, extract_coordinate, extract_str, first_list, list_at};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "geofencing";

const ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];

/// Geofencing service
#[derive(Clone)]
pub struct GeofencingService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for GeofencingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeofencingService").finish_non_exhaustive()
    }
}

impl GeofencingService {
    /// Create a new geofencing service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Which points fall inside which shapes
    ///
    /// Shapes containing no point are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty shape or point lists.
    #[instrument(skip(self, shapes, points), fields(shapes = shapes.len(), points = points.len()))]
    pub async fn check(
        &self,
        shapes: &[GeofenceShape],
        points: &[GeofencePoint],
    ) -> Result<Vec<GeofenceMatch>> {
        let params = build_geofence_params(shapes, points)?;
        let request = CercaliaRequest::services("geofencing", CMD, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let matches = parse_geofence_matches(&root, points);
        debug!(matched_shapes = matches.len(), "Geofencing completed");
        Ok(matches)
    }

    /// Whether one point lies inside one shape
    #[instrument(skip(self))]
    pub async fn contains(&self, shape: &GeofenceShape, point: &GeofencePoint) -> Result<bool> {
        let matches = self
            .check(std::slice::from_ref(shape), std::slice::from_ref(point))
            .await?;
        Ok(matches
            .iter()
            .any(|m| m.shape_id == shape.id && m.contains_point(&point.id)))
    }
}

/// WKT of one shape; circles use the vendor `CIRCLE(lng lat, radius)` form
///
/// # Errors
///
/// Returns `InvalidInput` for degenerate polygons or blank WKT.
fn shape_wkt(geometry: &GeofenceGeometry) -> Result<String> {
    match geometry {
        GeofenceGeometry::Circle { center, radius_m } => {
            Ok(format!("CIRCLE({}, {radius_m})", center.to_wkt_pair()))
        },
        GeofenceGeometry::Polygon { vertices } => polygon_wkt(vertices),
        GeofenceGeometry::Wkt { wkt } => non_empty(Some(wkt.as_str()))
            .map(str::to_string)
            .ok_or_else(|| CercaliaError::InvalidInput("shape WKT must not be empty".to_string())),
    }
}

/// Ids end up inside `[..|id]` brackets of a comma list
fn bracket_id<'a>(kind: &str, id: &'a str) -> Result<&'a str> {
    if id.trim().is_empty() || id.contains(['|', '[', ']', ',']) {
        return Err(CercaliaError::InvalidInput(format!(
            "{kind} id {id:?} must be non-empty and free of '|', '[', ']' and ','"
        )));
    }
    Ok(id)
}

/// Serialize shapes as `[WKT|id],...` and points as `[lng,lat|id],...`
///
/// # Errors
///
/// Returns `InvalidInput` for empty lists, an invalid shape, or an id that
/// would break the bracket encoding.
pub fn build_geofence_params(
    shapes: &[GeofenceShape],
    points: &[GeofencePoint],
) -> Result<QueryParams> {
    if shapes.is_empty() {
        return Err(CercaliaError::InvalidInput(
            "at least one geofence shape is required".to_string(),
        ));
    }
    if points.is_empty() {
        return Err(CercaliaError::InvalidInput(
            "at least one point is required".to_string(),
        ));
    }

    let shapes = shapes
        .iter()
        .map(|s| {
            let id = bracket_id("shape", &s.id)?;
            Ok(format!("[{}|{id}]", shape_wkt(&s.geometry)?))
        })
        .collect::<Result<Vec<_>>>()?;
    let points = points
        .iter()
        .map(|p| {
            let id = bracket_id("point", &p.id)?;
            Ok(format!("[{}|{id}]", p.coordinate.to_lng_lat()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut params = QueryParams::new();
    params
        .push("shapes", shapes.join(","))
        .push("points", points.join(","));
    Ok(params)
}

/// Parse `geofences.shape`, dropping shapes without contained points
///
/// Points the response lists without coordinates take them from `sent`.
#[must_use]
pub fn parse_geofence_matches(root: &Value, sent: &[GeofencePoint]) -> Vec<GeofenceMatch> {
    list_at(root, &["geofences", "shape"])
        .into_iter()
        .filter_map(|shape| {
            let Some(shape_id) = extract_str(shape, ID) else {
                warn!("Skipping geofence without id");
                return None;
            };

            let points: Vec<GeofencePoint> =
                first_list(shape, &[&["point"], &["points", "point"]])
                    .into_iter()
                    .filter_map(|node| parse_point(node, sent))
                    .collect();

            (!points.is_empty()).then_some(GeofenceMatch { shape_id, points })
        })
        .collect()
}

fn parse_point(node: &Value, sent: &[GeofencePoint]) -> Option<GeofencePoint> {
    let id = extract_str(node, ID);
    let coordinate = extract_coordinate(node).or_else(|| {
        id.as_deref()
            .and_then(|id| sent.iter().find(|p| p.id == id))
            .map(|p| p.coordinate)
    });

    match (id, coordinate) {
        (Some(id), Some(coordinate)) => Some(GeofencePoint { id, coordinate }),
        (id, _) => {
            warn!(id = ?id, "Skipping geofence point without id or coordinates");
            None
        },
    }
}
