// src/geocode/mod.rs

pub mod nominatim;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

pub use crate::record::Coordinates;
pub use nominatim::NominatimGeocoder;

/// Free-text place lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no such place.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

/// Look up `"<place>, <country>"`. Failures are logged and reported as `None`.
pub async fn locate(geocoder: &dyn Geocoder, country: &str, place: &str) -> Option<Coordinates> {
    let query = format!("{}, {}", place, country);
    match geocoder.geocode(&query).await {
        Ok(Some(coords)) => {
            debug!(%query, %coords, "geocoded");
            Some(coords)
        }
        Ok(None) => {
            warn!(%query, "no geocoding match");
            None
        }
        Err(e) => {
            warn!(%query, error = %e, "Geocoding error");
            None
        }
    }
}

/// Serializes lookups and keeps at least `min_interval` between the end of
/// one call and the start of the next.
pub struct RateLimitedGeocoder<G: Geocoder> {
    inner: G,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<G: Geocoder> RateLimitedGeocoder<G> {
    pub fn new(inner: G, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_call: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for RateLimitedGeocoder<G> {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let mut last_call = self.last_call.lock().await;
        if let Some(prev) = *last_call {
            sleep_until(prev + self.min_interval).await;
        }
        let result = self.inner.geocode(query).await;
        *last_call = Some(Instant::now());
        result
    }
}
