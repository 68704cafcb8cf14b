//! Rendered map images (`cmd=map`)
//!
//! A place name can be ambiguous; the vendor then answers with a candidate
//! list instead of a map, and the request is repeated once with the id of
//! the first candidate.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use domain::Coordinate;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::non_empty;
use crate::error::{CercaliaError, Result};
use crate::models::{GeoElementKind, MapExtent, StaticMap, StaticMapOptions};
use crate::response::{
    Extract, as_list, extract_coordinate, extract_str, extract_u64, list_at,
    parse_geographic_element,
};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "map";

const IMAGE_URL: &[Extract] = &[
    Extract::Path(&["img", "@href"]),
    Extract::Attr("href"),
    Extract::Path(&["img", "href"]),
    Extract::Text("href"),
];
const WIDTH: &[Extract] = &[Extract::Attr("width"), Extract::Text("width")];
const HEIGHT: &[Extract] = &[Extract::Attr("height"), Extract::Text("height")];
const SCALE: &[Extract] = &[Extract::Attr("scale"), Extract::Text("scale")];

/// Static map service
#[derive(Clone)]
pub struct StaticMapsService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for StaticMapsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMapsService").finish_non_exhaustive()
    }
}

impl StaticMapsService {
    /// Create a new static map service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Render a map
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` without a locality, center or extent, and
    /// `NotFound` when no map comes back even after disambiguation.
    #[instrument(skip(self))]
    pub async fn generate(&self, options: &StaticMapOptions) -> Result<StaticMap> {
        let params = build_map_params(options)?;
        let request = CercaliaRequest::services("static_map", CMD, params);
        let root = self.transport.execute(&request).await?;

        if let Some(map) = parse_map(&root) {
            debug!(url = %map.image_url, "Map rendered");
            return Ok(map);
        }

        let candidates = list_at(&root, &["candidates", "candidate"]);
        let retry = candidates
            .first()
            .and_then(|candidate| disambiguation_params(&request.params, candidate))
            .ok_or_else(|| CercaliaError::NotFound("no map in response".to_string()))?;

        info!(
            candidates = candidates.len(),
            "Ambiguous map location, retrying with first candidate"
        );
        let request = CercaliaRequest::services("static_map", CMD, retry);
        let root = self.transport.execute(&request).await?;

        parse_map(&root).ok_or_else(|| {
            CercaliaError::NotFound("map location still ambiguous after retry".to_string())
        })
    }

    /// Download the rendered image
    #[instrument(skip(self, map), fields(url = %map.image_url))]
    pub async fn fetch_image(&self, map: &StaticMap) -> Result<Bytes> {
        self.transport.fetch_bytes(&map.image_url).await
    }
}

/// Map static map options to vendor parameters
///
/// # Errors
///
/// Returns `InvalidInput` without a locality, center or extent.
pub fn build_map_params(options: &StaticMapOptions) -> Result<QueryParams> {
    let locality = non_empty(options.locality.as_deref());
    if locality.is_none() && options.center.is_none() && options.extent.is_none() {
        return Err(CercaliaError::InvalidInput(
            "a static map needs a locality, center or extent".to_string(),
        ));
    }

    let markers: Vec<String> = options
        .markers
        .iter()
        .map(|m| match m.icon {
            Some(icon) => format!("[{}|{icon}]", m.coordinate.to_lat_lng()),
            None => format!("[{}]", m.coordinate.to_lat_lng()),
        })
        .collect();

    let mut params = QueryParams::new();
    params
        .push_opt("ctn", locality)
        .push_opt("ctc", non_empty(options.country_code.as_deref()))
        .push_opt("mo", options.center.map(|c| c.to_lat_lng()))
        .push_opt("mapextent", options.extent.map(|e| e.to_param()))
        .push_opt("width", options.width)
        .push_opt("height", options.height)
        .push_opt("scale", options.scale)
        .push_opt("labelop", options.label_op);
    if !markers.is_empty() {
        params.push("molist", markers.join(","));
    }
    Ok(params)
}

/// Parameters of the retry for one disambiguation candidate
///
/// Drops `ctn` and adds the id parameter matching the candidate kind.
/// `None` when the candidate has no id.
#[must_use]
pub fn disambiguation_params(original: &QueryParams, candidate: &Value) -> Option<QueryParams> {
    let ge = as_list(candidate.get("ge")).first().copied().unwrap_or(candidate);
    let element = parse_geographic_element(ge);
    let id = element.id?;

    let key = match element.kind {
        GeoElementKind::Municipality => "munid",
        GeoElementKind::Subregion => "subregid",
        GeoElementKind::Region => "regid",
        GeoElementKind::Country => "ctryid",
        _ => "ctid",
    };

    let mut params = original.clone();
    params.remove("ctn");
    params.push(key, id);
    Some(params)
}

fn u32_at(node: &Value, strategies: &[Extract]) -> Option<u32> {
    extract_u64(node, strategies).and_then(|v| u32::try_from(v).ok())
}

fn parse_extent(node: &Value) -> Option<MapExtent> {
    let extent = node.get("extent")?;
    let upper_left = extent.get("upperleft").and_then(extract_coordinate);
    let lower_right = extent.get("lowerright").and_then(extract_coordinate);
    if let (Some(upper_left), Some(lower_right)) = (upper_left, lower_right) {
        return Some(MapExtent::new(upper_left, lower_right));
    }

    let corners: Vec<Coordinate> = as_list(extent.get("coord"))
        .into_iter()
        .filter_map(extract_coordinate)
        .collect();
    match corners.as_slice() {
        [upper_left, lower_right] => Some(MapExtent::new(*upper_left, *lower_right)),
        _ => None,
    }
}

/// Parse the `map` node, `None` when no image URL is present
#[must_use]
pub fn parse_map(root: &Value) -> Option<StaticMap> {
    let maps = list_at(root, &["map"]);
    let node = maps.first()?;
    let image_url = extract_str(node, IMAGE_URL)?;

    Some(StaticMap {
        image_url,
        width: u32_at(node, WIDTH),
        height: u32_at(node, HEIGHT),
        scale: u32_at(node, SCALE),
        center: node.get("center").and_then(extract_coordinate),
        extent: parse_extent(node),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapMarker;
    use crate::transport::MockCercaliaTransport;
    use serde_json::json;

    fn map_response() -> Value {
        json!({"map": {
            "@width": "400", "@height": "300", "@scale": "12",
            "img": {"@href": "https://img.cercalia.com/maps/abc.png"},
            "center": {"@x": "2.1734", "@y": "41.3851"},
            "extent": {
                "upperleft": {"@x": "2.10", "@y": "41.42"},
                "lowerright": {"@x": "2.24", "@y": "41.35"}
            }
        }})
    }

    fn candidates_response() -> Value {
        json!({"candidates": {"candidate": [
            {"@id": "1", "ge": {"@id": "0801910", "@name": "Barcelona", "@type": "mun"}},
            {"@id": "2", "ge": {"@id": "08", "@name": "Barcelona", "@type": "subreg"}}
        ]}})
    }

    #[test]
    fn test_required_only_params() {
        let options = StaticMapOptions {
            locality: Some("Barcelona".to_string()),
            ..Default::default()
        };
        assert_eq!(build_map_params(&options).unwrap().keys(), vec!["ctn"]);
    }

    #[test]
    fn test_all_params() {
        let options = StaticMapOptions {
            locality: None,
            country_code: Some("ESP".to_string()),
            center: Some(Coordinate::new(41.3851, 2.1734)),
            extent: None,
            width: Some(400),
            height: Some(300),
            scale: None,
            label_op: Some(0),
            markers: vec![
                MapMarker {
                    coordinate: Coordinate::new(41.3851, 2.1734),
                    icon: Some(1),
                },
                MapMarker {
                    coordinate: Coordinate::new(41.39, 2.17),
                    icon: None,
                },
            ],
        };
        let params = build_map_params(&options).unwrap();
        assert_eq!(
            params.keys(),
            vec!["ctc", "mo", "width", "height", "labelop", "molist"]
        );
        assert_eq!(params.get("molist"), Some("[41.3851,2.1734|1],[41.39,2.17]"));
    }

    #[test]
    fn test_nothing_to_show_rejected() {
        assert!(
            build_map_params(&StaticMapOptions::default())
                .unwrap_err()
                .is_validation()
        );
    }

    #[test]
    fn test_parse_map() {
        let map = parse_map(&map_response()).unwrap();
        assert_eq!(map.image_url, "https://img.cercalia.com/maps/abc.png");
        assert_eq!(map.width, Some(400));
        assert_eq!(map.scale, Some(12));
        assert_eq!(map.center, Some(Coordinate::new(41.3851, 2.1734)));
        let extent = map.extent.unwrap();
        assert_eq!(extent.upper_left, Coordinate::new(41.42, 2.10));
    }

    #[test]
    fn test_parse_map_extent_coord_list() {
        let root = json!({"map": {"@href": "u", "extent": {"coord": [
            {"@x": "2.10", "@y": "41.42"}, {"@x": "2.24", "@y": "41.35"}
        ]}}});
        let map = parse_map(&root).unwrap();
        assert_eq!(map.extent.unwrap().lower_right, Coordinate::new(41.35, 2.24));
    }

    #[test]
    fn test_disambiguation_params() {
        let mut original = QueryParams::new();
        original.push("ctn", "Barcelona").push("ctc", "ESP");
        let root = candidates_response();
        let candidates = list_at(&root, &["candidates", "candidate"]);

        let retry = disambiguation_params(&original, candidates[0]).unwrap();
        assert!(!retry.contains("ctn"));
        assert_eq!(retry.get("ctc"), Some("ESP"));
        assert_eq!(retry.get("munid"), Some("0801910"));
    }

    #[test]
    fn test_disambiguation_defaults_to_locality_id() {
        let candidate = json!({"ge": {"@id": "0801910001", "@name": "Barcelona"}});
        let retry = disambiguation_params(&QueryParams::new(), &candidate).unwrap();
        assert_eq!(retry.get("ctid"), Some("0801910001"));
        assert!(disambiguation_params(&QueryParams::new(), &json!({"ge": {}})).is_none());
    }

    #[tokio::test]
    async fn test_generate_reissues_for_candidates() {
        let mut mock = MockCercaliaTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_execute()
            .withf(|req| req.params.get("ctn") == Some("Barcelona"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(candidates_response()));
        mock.expect_execute()
            .withf(|req| !req.params.contains("ctn") && req.params.get("munid") == Some("0801910"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(map_response()));

        let options = StaticMapOptions {
            locality: Some("Barcelona".to_string()),
            ..Default::default()
        };
        let map = StaticMapsService::new(Arc::new(mock))
            .generate(&options)
            .await
            .unwrap();
        assert_eq!(map.width, Some(400));
    }

    #[tokio::test]
    async fn test_still_ambiguous_is_not_found() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_execute()
            .times(2)
            .returning(|_| Ok(candidates_response()));

        let options = StaticMapOptions {
            locality: Some("Barcelona".to_string()),
            ..Default::default()
        };
        let err = StaticMapsService::new(Arc::new(mock))
            .generate(&options)
            .await
            .unwrap_err();
        assert!(matches!(err, CercaliaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_fetch_bytes()
            .withf(|url| url == "https://img.cercalia.com/maps/abc.png")
            .returning(|_| Ok(Bytes::from_static(b"\x89PNG")));

        let service = StaticMapsService::new(Arc::new(mock));
        let map = parse_map(&map_response()).unwrap();
        let bytes = service.fetch_image(&map).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNG");
    }
}
