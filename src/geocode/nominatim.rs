// src/geocode/nominatim.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{Coordinates, Geocoder};
use crate::config::GeocoderConfig;

/// Client for an OpenStreetMap Nominatim `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(cfg: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.as_str())
            .build()
            .context("building geocoder client")?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = self.search_url(query);
        let places: Vec<Place> = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .json()
            .await
            .with_context(|| format!("decoding geocoder response from {}", url))?;

        places.first().map(parse_place).transpose()
    }
}

fn parse_place(place: &Place) -> Result<Coordinates> {
    let lat = place
        .lat
        .parse::<f64>()
        .with_context(|| format!("bad latitude {:?}", place.lat))?;
    let lon = place
        .lon
        .parse::<f64>()
        .with_context(|| format!("bad longitude {:?}", place.lon))?;
    Ok(Coordinates::new(lat, lon))
}
