//! Nearest POIs around a point (`cmd=prox`)

use std::fmt;
use std::sync::Arc;

use domain::Coordinate;
use tracing::{debug, instrument};

use super::poi::parse_poi_list;
use crate::error::{Result, empty_on_no_results};
use crate::models::{Poi, ProximityOptions};
use crate::transport::{CercaliaRequest, CercaliaTransport, QueryParams};

const CMD: &str = "prox";

/// Proximity search service
#[derive(Clone)]
pub struct ProximityService {
    transport: Arc<dyn CercaliaTransport>,
}

impl fmt::Debug for ProximityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProximityService").finish_non_exhaustive()
    }
}

impl ProximityService {
    /// Create a new proximity service
    #[must_use]
    pub fn new(transport: Arc<dyn CercaliaTransport>) -> Self {
        Self { transport }
    }

    /// POIs closest to a point, nearest first
    ///
    /// An empty match is returned as an empty list.
    #[instrument(skip(self))]
    pub async fn search(&self, options: &ProximityOptions) -> Result<Vec<Poi>> {
        let request =
            CercaliaRequest::services("proximity", CMD, build_proximity_params(options));
        let root = empty_on_no_results(self.transport.execute(&request).await)?;
        let pois = parse_poi_list(&root);
        debug!(count = pois.len(), "Proximity search completed");
        Ok(pois)
    }

    /// The `count` nearest POIs of one category
    #[instrument(skip(self))]
    pub async fn nearest_by_category(
        &self,
        center: Coordinate,
        category: &str,
        count: u32,
    ) -> Result<Vec<Poi>> {
        let options = ProximityOptions {
            categories: vec![category.to_string()],
            count: Some(count),
            ..ProximityOptions::new(center)
        };
        self.search(&options).await
    }
}

/// Map proximity options to vendor parameters
#[must_use]
pub fn build_proximity_params(options: &ProximityOptions) -> QueryParams {
    let categories: Vec<&str> = options
        .categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    let mut params = QueryParams::new();
    params.push("mo", options.center.to_lat_lng());
    if !categories.is_empty() {
        params.push("rqpoicats", categories.join(","));
    }
    params
        .push_opt("num", options.count)
        .push_opt("rad", options.radius_m)
        .push_opt("weight", options.routing.map(|w| w.as_param()));
    params
}
