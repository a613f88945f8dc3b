//! Location providers: a fixed position for demos and tests, and an
//! always-failing one for exercising the no-location fallbacks.

use async_trait::async_trait;
use voyce_core::{GeoLocation, LocationProvider, VoyceError, VoyceResult};

/// Reports a fixed position. Defaults to central Chennai, the same anchor
/// city the offline culture tables are richest for.
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    location: GeoLocation,
}

impl FixedLocationProvider {
    pub fn new(location: GeoLocation) -> Self {
        Self { location }
    }

    pub fn chennai() -> Self {
        Self::new(GeoLocation {
            lat: 13.0827,
            lng: 80.2707,
            accuracy: 15.0,
            city: Some("Chennai".to_string()),
            country: Some("India".to_string()),
            region: Some("Tamil Nadu".to_string()),
        })
    }

    pub fn mumbai() -> Self {
        Self::new(GeoLocation {
            lat: 19.0760,
            lng: 72.8777,
            accuracy: 15.0,
            city: Some("Mumbai".to_string()),
            country: Some("India".to_string()),
            region: Some("Maharashtra".to_string()),
        })
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> VoyceResult<GeoLocation> {
        Ok(self.location.clone())
    }
}

/// Always fails, as a denied or unsupported geolocation capability would.
#[derive(Debug, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn current_location(&self) -> VoyceResult<GeoLocation> {
        Err(VoyceError::Location("geolocation unavailable".to_string()))
    }
}
