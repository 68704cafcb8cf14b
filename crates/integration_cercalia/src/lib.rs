//! Cercalia geospatial web service client
//!
//! Typed access to the [Cercalia](https://www.cercalia.com) API: geocoding,
//! reverse geocoding, routing, isochrones, proximity and POI search,
//! geofencing, snap-to-road, static maps and address suggestions.
//!
//! # Architecture
//!
//! Every service turns a typed options struct into vendor query parameters,
//! sends them through the shared [`CercaliaTransport`] and parses the
//! response tree into typed results. [`HttpTransport`] is the reqwest-based
//! implementation; tests inject a mock instead. All computation happens on
//! the vendor side; this crate only marshals parameters and results.
//!
//! Operations are `async` and never spawn tasks; run several at once with
//! `tokio::join!` or `tokio::spawn` as needed. Search-style operations return
//! an empty list (or `None`) when the vendor reports no results.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::Coordinate;
//! use integration_cercalia::{CercaliaClient, CercaliaConfig, RouteOptions};
//!
//! let client = CercaliaClient::new(CercaliaConfig::new("my-api-key"))?;
//!
//! let route = client
//!     .routing()
//!     .route(
//!         Coordinate::new(41.3851, 2.1734), // Barcelona
//!         Coordinate::new(40.4168, -3.7038), // Madrid
//!         &RouteOptions::default(),
//!     )
//!     .await?;
//! println!("{:.1} km in {}", route.distance_km(), route.duration_hms());
//! ```

mod client;
mod config;
mod error;
pub mod models;
pub mod response;
pub mod services;
mod transport;

pub use client::CercaliaClient;
pub use config::CercaliaConfig;
pub use error::{CercaliaError, Result};
pub use models::*;
pub use services::{
    GeocodingService, GeofencingService, IsochroneService, PoiService, ProximityService,
    ReverseGeocodingService, RoutingService, SnapToRoadService, StaticMapsService, SuggestService,
};
pub use transport::{
    CercaliaRequest, CercaliaTransport, Endpoint, HttpTransport, NO_RESULTS_CODES, QueryParams,
};
