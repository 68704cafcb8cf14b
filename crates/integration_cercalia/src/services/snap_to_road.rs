//! GPS map matching (`cmd=geomtrack`)

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::km_to_m;
use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{GpsPoint, SnapToRoadOptions, SnappedSegment};
use crate::response::{Extract, extract_bool, extract_f64, extract_str, first_list};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "geomtrack";

const SEGMENT_ATTRIBUTE: &[Extract] = &[Extract::Attr("attribute"), Extract::Text("attribute")];
const SEGMENT_DISTANCE: &[Extract] = &[Extract::Attr("distance"), Extract::Text("distance")];
const SEGMENT_SPEEDING: &[Extract] = &[Extract::Attr("speeding"), Extract::Text("speeding")];
const SEGMENT_WKT: &[Extract] = &[
    Extract::Text("value"),
    Extract::Wrapped("wkt"),
    Extract::Text("wkt"),
    Extract::Attr("wkt"),
];

/// Snap-to-road service
#[derive(Clone)]
pub struct SnapToRoadService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for SnapToRoadService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapToRoadService").finish_non_exhaustive()
    }
}

impl SnapToRoadService {
    /// Create a new snap-to-road service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Match a GPS track to the road network
    ///
    /// One segment is returned per run of points sharing an attribute.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than two points.
    #[instrument(skip(self, points), fields(points = points.len()))]
    pub async fn snap(
        &self,
        points: &[GpsPoint],
        options: &SnapToRoadOptions,
    ) -> Result<Vec<SnappedSegment>> {
        let params = build_snap_params(points, options)?;
        let request = CercaliaRequest::services("snap_to_road", CMD, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let segments = parse_segments(&root);
        debug!(segments = segments.len(), "Track matched");
        Ok(segments)
    }
}

/// Encode one fix as `[lng,lat@compass,angle@@speed@@@attribute]`
///
/// Slots are positional; trailing empty slots are dropped.
#[must_use]
pub fn encode_track_point(point: &GpsPoint) -> String {
    let heading = match (point.compass, point.angle) {
        (Some(compass), Some(angle)) => format!("{compass},{angle}"),
        (Some(compass), None) => compass.to_string(),
        (None, Some(angle)) => format!(",{angle}"),
        (None, None) => String::new(),
    };

    let mut slots = vec![
        point.coordinate.to_lng_lat(),
        heading,
        String::new(),
        point.speed.map(|s| s.to_string()).unwrap_or_default(),
        String::new(),
        String::new(),
        point.attribute.clone().unwrap_or_default(),
    ];
    while slots.last().is_some_and(String::is_empty) {
        slots.pop();
    }

    format!("[{}]", slots.join("@"))
}

/// Encode a whole track, points joined by `,`
#[must_use]
pub fn encode_track(points: &[GpsPoint]) -> String {
    points
        .iter()
        .map(encode_track_point)
        .collect::<Vec<_>>()
        .join(",")
}

/// Map a track and options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` for fewer than two points.
pub fn build_snap_params(points: &[GpsPoint], options: &SnapToRoadOptions) -> Result<QueryParams> {
    if points.len() < 2 {
        return Err(CercaliaError::InvalidInput(format!(
            "a track needs at least 2 points, got {}",
            points.len()
        )));
    }

    let mut params = QueryParams::new();
    params
        .push("track", encode_track(points))
        .push_opt("weight", options.weight.map(|w| w.as_param()))
        .push_opt("tolerance", options.tolerance_m);
    if let Some(tolerance) = options.speeding_tolerance {
        params
            .push("speeding", "true")
            .push("speedtolerance", tolerance.to_string());
    }
    Ok(params)
}

/// Parse `geomtrack.geometry` (or `track.geometry`)
///
/// Segments without geometry are skipped.
#[must_use]
pub fn parse_segments(root: &Value) -> Vec<SnappedSegment> {
    first_list(root, &[&["geomtrack", "geometry"], &["track", "geometry"]])
        .into_iter()
        .filter_map(|node| {
            let attribute = extract_str(node, SEGMENT_ATTRIBUTE);
            let Some(wkt) = extract_str(node, SEGMENT_WKT) else {
                warn!(attribute = ?attribute, "Skipping track segment without geometry");
                return None;
            };
            Some(SnappedSegment {
                distance_m: extract_f64(node, SEGMENT_DISTANCE).map(km_to_m),
                speeding: extract_bool(node, SEGMENT_SPEEDING),
                attribute,
                wkt,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteWeight;
    use crate::transport::MockCercaliaTransport;
    use domain::Coordinate;
    use serde_json::json;

    fn fix(lng: f64, lat: f64, speed: u32) -> GpsPoint {
        GpsPoint {
            compass: Some(0),
            angle: Some(45),
            speed: Some(speed),
            attribute: Some("A".to_string()),
            ..GpsPoint::new(Coordinate::new(lat, lng))
        }
    }

    fn track() -> Vec<GpsPoint> {
        vec![fix(2.825850, 41.969279, 70), fix(2.822355, 41.965995, 10)]
    }

    #[test]
    fn test_track_encoding() {
        assert_eq!(
            encode_track(&track()),
            "[2.82585,41.969279@0,45@@70@@@A],[2.822355,41.965995@0,45@@10@@@A]"
        );
    }

    #[test]
    fn test_sparse_points() {
        let bare = GpsPoint::new(Coordinate::new(41.0, 2.0));
        assert_eq!(encode_track_point(&bare), "[2,41]");

        let compass_only = GpsPoint {
            compass: Some(90),
            ..bare.clone()
        };
        assert_eq!(encode_track_point(&compass_only), "[2,41@90]");

        let angle_and_speed = GpsPoint {
            angle: Some(30),
            speed: Some(50),
            ..bare.clone()
        };
        assert_eq!(encode_track_point(&angle_and_speed), "[2,41@,30@@50]");

        let attribute_only = GpsPoint {
            attribute: Some("B".to_string()),
            ..bare
        };
        assert_eq!(encode_track_point(&attribute_only), "[2,41@@@@@@B]");
    }

    #[test]
    fn test_params() {
        let options = SnapToRoadOptions {
            weight: Some(RouteWeight::Distance),
            tolerance_m: Some(20),
            speeding_tolerance: Some(10),
        };
        let params = build_snap_params(&track(), &options).unwrap();
        assert_eq!(
            params.keys(),
            vec!["track", "weight", "tolerance", "speeding", "speedtolerance"]
        );

        let params = build_snap_params(&track(), &SnapToRoadOptions::default()).unwrap();
        assert_eq!(params.keys(), vec!["track"]);
    }

    #[test]
    fn test_single_point_rejected() {
        let err = build_snap_params(&track()[..1], &SnapToRoadOptions::default()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parse_segments() {
        let root = json!({"geomtrack": {"geometry": [
            {"@attribute": "A", "@distance": "1.25", "@speeding": "true",
             "value": "LINESTRING(2.82585 41.969279, 2.822355 41.965995)"},
            {"@attribute": "B"}
        ]}});
        let segments = parse_segments(&root);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].attribute.as_deref(), Some("A"));
        assert_eq!(segments[0].distance_m, Some(1250.0));
        assert_eq!(segments[0].speeding, Some(true));
    }

    #[test]
    fn test_parse_track_fallback() {
        let root = json!({"track": {"geometry": {"wkt": {"value": "LINESTRING(1 2, 3 4)"}}}});
        let segments = parse_segments(&root);
        assert_eq!(segments[0].wkt, "LINESTRING(1 2, 3 4)");
    }

    #[tokio::test]
    async fn test_snap() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_execute()
            .withf(|req| req.cmd() == Some("geomtrack") && req.params.contains("track"))
            .returning(|_| {
                Ok(json!({"geomtrack": {"geometry": {"@attribute": "A", "value": "LINESTRING(1 2, 3 4)"}}}))
            });

        let segments = SnapToRoadService::new(Arc::new(mock))
            .snap(&track(), &SnapToRoadOptions::default())
            .await
            .unwrap();
        assert_eq!(segments.len(), 1);
    }
}
