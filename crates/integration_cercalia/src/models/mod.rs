//! Option and result types of the Cercalia services

mod geo_element;
mod geocoding;
mod geofencing;
mod isochrone;
mod poi;
mod reverse_geocoding;
mod routing;
mod snap_to_road;
mod static_maps;
mod suggest;

pub use geo_element::{GeoElementKind, GeographicElement};
pub use geocoding::{DEFAULT_COUNTRY_CODE, GeocodingCandidate, GeocodingOptions};
pub use geofencing::{GeofenceGeometry, GeofenceMatch, GeofencePoint, GeofenceShape};
pub use isochrone::{Isochrone, IsochroneMethod, IsochroneOptions, IsochroneWeight};
pub use poi::{MapExtent, Poi, ProximityOptions};
pub use reverse_geocoding::{
    BatchReverseGeocode, MAX_BATCH_SIZE, ReverseGeocodeLevel, ReverseGeocodeResult, TimezoneInfo,
};
pub use routing::{DimensionLimit, RouteOptions, RouteResult, RouteWeight, TruckProfile};
pub use snap_to_road::{GpsPoint, SnapToRoadOptions, SnappedSegment};
pub use static_maps::{MapMarker, StaticMap, StaticMapOptions};
pub use suggest::{
    HouseNumbers, SuggestGeocodeOptions, SuggestGeocodeResult, SuggestKind, SuggestOptions,
    Suggestion,
};
