//! POI searches inside an area (`cmd=prox` with `mapextent`, `wkt` or `rwkt`)

use std::fmt;
use std::sync::Arc;

use domain::Coordinate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{non_empty, polygon_wkt, required_categories};
use crate::error::{CercaliaError, Result, empty_on_no_results};
use crate::models::{MapExtent, Poi};
use crate::response::{
    Extract, as_list, extract_coordinate, extract_f64, extract_str, extract_u64, first_list,
    parse_geographic_element,
};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "prox";

const POI_ID: &[Extract] = &[Extract::Attr("id"), Extract::Text("id")];
const POI_NAME: &[Extract] = &[
    Extract::Wrapped("name"),
    Extract::Text("name"),
    Extract::Attr("name"),
];
const POI_INFO: &[Extract] = &[
    Extract::Wrapped("info"),
    Extract::Text("info"),
    Extract::Attr("info"),
];
const POI_CATEGORY: &[Extract] = &[Extract::Attr("category_id"), Extract::Text("category_id")];
const POI_SUBCATEGORY: &[Extract] = &[
    Extract::Attr("subcategory_id"),
    Extract::Text("subcategory_id"),
];
const POI_DIST: &[Extract] = &[Extract::Attr("dist"), Extract::Text("dist")];
const POI_POS: &[Extract] = &[Extract::Attr("pos"), Extract::Text("pos")];
const POI_ROUTE_DIST: &[Extract] = &[Extract::Attr("routedist"), Extract::Text("routedist")];
const POI_ROUTE_TIME: &[Extract] = &[Extract::Attr("routetime"), Extract::Text("routetime")];

/// POI area search service
#[derive(Clone)]
pub struct PoiService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for PoiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoiService").finish_non_exhaustive()
    }
}

impl PoiService {
    /// Create a new POI service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// POIs of the given categories inside a rectangle
    ///
    /// `grid_size` thins out dense areas to one POI per grid cell.
    #[instrument(skip(self))]
    pub async fn search_in_extent(
        &self,
        extent: &MapExtent,
        categories: &[String],
        grid_size: Option<u32>,
    ) -> Result<Vec<Poi>> {
        let params = build_extent_params(extent, categories, grid_size)?;
        self.search("poi_in_extent", params).await
    }

    /// POIs of the given categories inside a polygon
    #[instrument(skip(self, vertices), fields(vertices = vertices.len()))]
    pub async fn search_in_polygon(
        &self,
        vertices: &[Coordinate],
        categories: &[String],
    ) -> Result<Vec<Poi>> {
        let params = build_polygon_params(vertices, categories)?;
        self.search("poi_in_polygon", params).await
    }

    /// POIs of the given categories along a route geometry
    #[instrument(skip(self, route_wkt))]
    pub async fn search_along_route(
        &self,
        route_wkt: &str,
        categories: &[String],
        buffer_m: Option<u32>,
    ) -> Result<Vec<Poi>> {
        let params = build_along_route_params(route_wkt, categories, buffer_m)?;
        self.search("poi_along_route", params).await
    }

    async fn search(&self, operation: &'static str, params: QueryParams) -> Result<Vec<Poi>> {
        let request = CercaliaRequest::services(operation, CMD, params);
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let pois = parse_poi_list(&root);
        debug!(count = pois.len(), "POI search completed");
        Ok(pois)
    }
}

/// Parameters of an extent search
///
/// # Errors
///
/// Returns `InvalidInput` without categories.
pub fn build_extent_params(
    extent: &MapExtent,
    categories: &[String],
    grid_size: Option<u32>,
) -> Result<QueryParams> {
    let mut params = QueryParams::new();
    params
        .push("mapextent", extent.to_param())
        .push("rqpoicats", required_categories(categories)?)
        .push_opt("gridsize", grid_size);
    Ok(params)
}

/// Parameters of a polygon search
///
/// # Errors
///
/// Returns `InvalidInput` without categories or with fewer than three vertices.
pub fn build_polygon_params(vertices: &[Coordinate], categories: &[String]) -> Result<QueryParams> {
    let mut params = QueryParams::new();
    params
        .push("wkt", polygon_wkt(vertices)?)
        .push("rqpoicats", required_categories(categories)?);
    Ok(params)
}

/// Parameters of a search along a route
///
/// # Errors
///
/// Returns `InvalidInput` without categories or route geometry.
pub fn build_along_route_params(
    route_wkt: &str,
    categories: &[String],
    buffer_m: Option<u32>,
) -> Result<QueryParams> {
    let route_wkt = non_empty(Some(route_wkt)).ok_or_else(|| {
        CercaliaError::InvalidInput("route geometry must not be empty".to_string())
    })?;

    let mut params = QueryParams::new();
    params
        .push("rwkt", route_wkt)
        .push("rqpoicats", required_categories(categories)?)
        .push_opt("rad", buffer_m);
    Ok(params)
}

/// Parse the POI list of a proximity or area response
///
/// POIs without coordinates are skipped.
#[must_use]
pub fn parse_poi_list(root: &Value) -> Vec<Poi> {
    first_list(root, &[&["proximity", "poilist", "poi"], &["poilist", "poi"]])
        .into_iter()
        .filter_map(parse_poi)
        .collect()
}

/// Parse one `poi` node, `None` without coordinates
#[must_use]
pub fn parse_poi(node: &Value) -> Option<Poi> {
    let id = extract_str(node, POI_ID);
    let element = as_list(node.get("ge"))
        .into_iter()
        .next()
        .map(parse_geographic_element);

    let coordinate = extract_coordinate(node)
        .or_else(|| element.as_ref().and_then(|e| e.coordinate));
    let Some(coordinate) = coordinate else {
        warn!(id = ?id, "Skipping POI without coordinates");
        return None;
    };

    Some(Poi {
        id,
        name: extract_str(node, POI_NAME),
        info: extract_str(node, POI_INFO),
        category_code: extract_str(node, POI_CATEGORY),
        subcategory_code: extract_str(node, POI_SUBCATEGORY),
        distance_m: extract_f64(node, POI_DIST),
        position: extract_u64(node, POI_POS),
        route_distance_m: extract_f64(node, POI_ROUTE_DIST),
        route_time_secs: extract_u64(node, POI_ROUTE_TIME),
        coordinate,
        element,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockCercaliaTransport;
    use serde_json::json;

    fn categories() -> Vec<String> {
        vec!["C001".to_string(), "C007".to_string()]
    }

    #[test]
    fn test_extent_params() {
        let extent = MapExtent::new(Coordinate::new(41.40, 2.15), Coordinate::new(41.37, 2.19));
        let params = build_extent_params(&extent, &categories(), None).unwrap();
        assert_eq!(params.keys(), vec!["mapextent", "rqpoicats"]);
        assert_eq!(params.get("mapextent"), Some("41.4,2.15|41.37,2.19"));
        assert_eq!(params.get("rqpoicats"), Some("C001,C007"));

        let params = build_extent_params(&extent, &categories(), Some(100)).unwrap();
        assert_eq!(params.get("gridsize"), Some("100"));
    }

    #[test]
    fn test_polygon_params() {
        let vertices = [
            Coordinate::new(41.0, 2.0),
            Coordinate::new(41.0, 3.0),
            Coordinate::new(42.0, 3.0),
        ];
        let params = build_polygon_params(&vertices, &categories()).unwrap();
        assert_eq!(params.get("wkt"), Some("POLYGON((2 41, 3 41, 3 42, 2 41))"));
    }

    #[test]
    fn test_along_route_params() {
        let params =
            build_along_route_params("LINESTRING(2 41, 3 42)", &categories(), Some(500)).unwrap();
        assert_eq!(params.keys(), vec!["rwkt", "rqpoicats", "rad"]);
        assert!(build_along_route_params(" ", &categories(), None).is_err());
    }

    #[test]
    fn test_categories_required() {
        let extent = MapExtent::new(Coordinate::new(41.40, 2.15), Coordinate::new(41.37, 2.19));
        assert!(build_extent_params(&extent, &[], None).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_poi_full() {
        let node = json!({
            "@id": "1234", "@dist": "250", "@pos": "1",
            "@category_id": "C001", "@subcategory_id": "C001-2",
            "@routedist": "410", "@routetime": "95",
            "name": {"value": "Gasolinera Repsol"},
            "info": "24h",
            "coord": {"@x": "2.17", "@y": "41.38"},
            "ge": {
                "@name": "Carrer de Pau Claris",
                "municipality": {"@id": "0801910", "value": "Barcelona"}
            }
        });
        let poi = parse_poi(&node).unwrap();
        assert_eq!(poi.id.as_deref(), Some("1234"));
        assert_eq!(poi.name.as_deref(), Some("Gasolinera Repsol"));
        assert_eq!(poi.info.as_deref(), Some("24h"));
        assert_eq!(poi.category_code.as_deref(), Some("C001"));
        assert_eq!(poi.distance_m, Some(250.0));
        assert_eq!(poi.position, Some(1));
        assert_eq!(poi.route_time_secs, Some(95));
        let municipality = poi.element.unwrap().municipality.unwrap();
        assert_eq!(municipality.code.as_deref(), Some("0801910"));
    }

    #[test]
    fn test_parse_skips_poi_without_coordinates() {
        let root = json!({"proximity": {"poilist": {"poi": [
            {"@id": "1", "name": "A", "coord": {"@x": "2.1", "@y": "41.1"}},
            {"@id": "2", "name": "B"},
            {"@id": "3", "name": "C", "ge": {"coord": {"@x": "2.3", "@y": "41.3"}}}
        ]}}});
        let pois = parse_poi_list(&root);
        let ids: Vec<&str> = pois.iter().filter_map(|p| p.id.as_deref()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_no_results_is_empty() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_execute().returning(|_| {
            Err(CercaliaError::NoResults {
                operation: "poi_in_polygon".to_string(),
            })
        });

        let vertices = [
            Coordinate::new(41.0, 2.0),
            Coordinate::new(41.0, 3.0),
            Coordinate::new(42.0, 3.0),
        ];
        let pois = PoiService::new(Arc::new(mock))
            .search_in_polygon(&vertices, &categories())
            .await
            .unwrap();
        assert!(pois.is_empty());
    }

    #[tokio::test]
    async fn test_small_polygon_sends_nothing() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_execute().never();

        let err = PoiService::new(Arc::new(mock))
            .search_in_polygon(&[Coordinate::new(41.0, 2.0)], &categories())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
