//! Per-domain Cercalia services
//!
//! Each service pairs a pure parameter builder with a pure response parser
//! and awaits exactly one transport call in between.

mod geocoding;
mod geofencing;
mod isochrone;
mod poi;
mod proximity;
mod reverse_geocoding;
mod routing;
mod snap_to_road;
mod static_maps;
mod suggest;

pub use geocoding::{
    GeocodingService, build_geocode_params, build_milestone_params, build_postal_code_params,
    parse_candidates,
};
pub use geofencing::{GeofencingService, build_geofence_params, parse_geofence_matches};
pub use isochrone::{IsochroneService, build_isochrone_params, parse_isochrones};
pub use poi::{
    PoiService, build_along_route_params, build_extent_params, build_polygon_params, parse_poi,
    parse_poi_list,
};
pub use proximity::{ProximityService, build_proximity_params};
pub use reverse_geocoding::{
    ReverseGeocodingService, build_batch_params, build_reverse_params, build_timezone_params,
    parse_batch, parse_reverse, parse_timezone,
};
pub use routing::{RoutingService, build_route_params, parse_duration, parse_route};
pub use snap_to_road::{
    SnapToRoadService, build_snap_params, encode_track, encode_track_point, parse_segments,
};
pub use static_maps::{
    StaticMapsService, build_map_params, disambiguation_params, parse_map,
};
pub use suggest::{
    SuggestService, build_suggest_geocode_params, build_suggest_params, parse_suggest_geocode,
    parse_suggestions,
};

use domain::Coordinate;

use crate::error::{CercaliaError, Result};

/// Trimmed value, `None` when absent or blank
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Comma-joined category codes; errors when the list is empty
pub(crate) fn required_categories(categories: &[String]) -> Result<String> {
    let codes: Vec<&str> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if codes.is_empty() {
        return Err(CercaliaError::InvalidInput(
            "at least one POI category is required".to_string(),
        ));
    }
    Ok(codes.join(","))
}

/// `POLYGON((lng lat, ...))` with the ring closed
///
/// # Errors
///
/// Returns `InvalidInput` for fewer than three distinct vertices.
pub(crate) fn polygon_wkt(vertices: &[Coordinate]) -> Result<String> {
    let open = match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) if vertices.len() > 1 && first == last => {
            &vertices[..vertices.len() - 1]
        },
        _ => vertices,
    };
    if open.len() < 3 {
        return Err(CercaliaError::InvalidInput(format!(
            "a polygon needs at least 3 vertices, got {}",
            open.len()
        )));
    }

    let ring: Vec<String> = open
        .iter()
        .chain(open.first())
        .map(Coordinate::to_wkt_pair)
        .collect();
    Ok(format!("POLYGON(({}))", ring.join(", ")))
}

/// Kilometers as reported by the vendor, converted to meters
pub(crate) fn km_to_m(km: f64) -> f64 {
    km * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(" Madrid ")), Some("Madrid"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_required_categories() {
        let cats = vec!["C001".to_string(), " ".to_string(), "C007".to_string()];
        assert_eq!(required_categories(&cats).unwrap(), "C001,C007");
        assert!(required_categories(&[]).unwrap_err().is_validation());
    }

    #[test]
    fn test_polygon_closes_ring() {
        let vertices = [
            Coordinate::new(41.0, 2.0),
            Coordinate::new(41.0, 3.0),
            Coordinate::new(42.0, 3.0),
        ];
        assert_eq!(
            polygon_wkt(&vertices).unwrap(),
            "POLYGON((2 41, 3 41, 3 42, 2 41))"
        );
    }

    #[test]
    fn test_polygon_already_closed() {
        let vertices = [
            Coordinate::new(41.0, 2.0),
            Coordinate::new(41.0, 3.0),
            Coordinate::new(42.0, 3.0),
            Coordinate::new(41.0, 2.0),
        ];
        assert_eq!(
            polygon_wkt(&vertices).unwrap(),
            "POLYGON((2 41, 3 41, 3 42, 2 41))"
        );
    }

    #[test]
    fn test_polygon_too_small() {
        let vertices = [Coordinate::new(41.0, 2.0), Coordinate::new(41.0, 3.0)];
        assert!(polygon_wkt(&vertices).unwrap_err().is_validation());
    }
}
