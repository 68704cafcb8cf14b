//! Entry point bundling every Cercalia service over one transport

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::CercaliaConfig;
use crate::error::{CercaliaError, Result};
use crate::services::{
    GeocodingService, GeofencingService, IsochroneService, PoiService, ProximityService,
    ReverseGeocodingService, RoutingService, SnapToRoadService, StaticMapsService, SuggestService,
};
use crate::transport::{CercaliaTransport, HttpTransport};

/// Cercalia API client
///
/// Cheap to clone; all clones share the HTTP connection pool.
#[derive(Clone)]
pub struct CercaliaClient {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for CercaliaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CercaliaClient").finish_non_exhaustive()
    }
}

impl CercaliaClient {
    /// Create a client talking HTTP to the configured endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: CercaliaConfig) -> Result<Self> {
        info!(base_url = %config.base_url, "Creating Cercalia client");
        let transport = HttpTransport::new(Arc::new(config))?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Create a client from `cercalia.toml` and `CERCALIA_*` variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration cannot be loaded.
    pub fn from_env() -> Result<Self> {
        let config =
            CercaliaConfig::load().map_err(|e| CercaliaError::ConfigurationError(e.to_string()))?;
        Self::new(config)
    }

    /// Create a client over any transport
    #[must_use]
    pub fn with_transport(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// Address and place geocoding
    #[must_use]
    pub fn geocoding(&self) -> GeocodingService {
        GeocodingService::new(Arc::clone(&self.transport))
    }

    /// Coordinate to place resolution
    #[must_use]
    pub fn reverse_geocoding(&self) -> ReverseGeocodingService {
        ReverseGeocodingService::new(Arc::clone(&self.transport))
    }

    /// Route calculation
    #[must_use]
    pub fn routing(&self) -> RoutingService {
        RoutingService::new(Arc::clone(&self.transport))
    }

    /// Reachable areas
    #[must_use]
    pub fn isochrone(&self) -> IsochroneService {
        IsochroneService::new(Arc::clone(&self.transport))
    }

    /// Nearest POIs around a point
    #[must_use]
    pub fn proximity(&self) -> ProximityService {
        ProximityService::new(Arc::clone(&self.transport))
    }

    /// POIs inside an area
    #[must_use]
    pub fn poi(&self) -> PoiService {
        PoiService::new(Arc::clone(&self.transport))
    }

    /// Point-in-shape tests
    #[must_use]
    pub fn geofencing(&self) -> GeofencingService {
        GeofencingService::new(Arc::clone(&self.transport))
    }

    /// GPS map matching
    #[must_use]
    pub fn snap_to_road(&self) -> SnapToRoadService {
        SnapToRoadService::new(Arc::clone(&self.transport))
    }

    /// Rendered map images
    #[must_use]
    pub fn static_maps(&self) -> StaticMapsService {
        StaticMapsService::new(Arc::clone(&self.transport))
    }

    /// Address autocomplete
    #[must_use]
    pub fn suggest(&self) -> SuggestService {
        SuggestService::new(Arc::clone(&self.transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReverseGeocodeLevel;
    use crate::transport::MockCercaliaTransport;
    use domain::Coordinate;
    use serde_json::json;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = CercaliaClient::new(CercaliaConfig::new("")).unwrap_err();
        assert!(matches!(err, CercaliaError::ConfigurationError(_)));
    }

    #[test]
    fn test_new_with_valid_config() {
        assert!(CercaliaClient::new(CercaliaConfig::for_testing("http://localhost:1")).is_ok());
    }

    #[tokio::test]
    async fn test_services_share_transport() {
        let mut mock = MockCercaliaTransport::new();
        mock.expect_execute()
            .times(2)
            .returning(|_| Ok(json!({"proximity": {"gelist": {"ge": {"@id": "1", "@name": "Girona"}}}})));

        let client = CercaliaClient::with_transport(Arc::new(mock));
        let here = Coordinate::new(41.98, 2.82);

        let place = client
            .reverse_geocoding()
            .reverse_geocode(here, ReverseGeocodeLevel::Locality)
            .await
            .unwrap();
        assert!(place.is_some());

        let pois = client
            .proximity()
            .nearest_by_category(here, "C001", 1)
            .await
            .unwrap();
        assert!(pois.is_empty());
    }
}
