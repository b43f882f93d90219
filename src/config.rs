// src/config.rs

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_SOURCE_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_association_football_stadiums_by_capacity";

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

static DEFAULT_GEOCODER_ENDPOINT: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_GEOCODER_URL).expect("default geocoder URL should parse"));

/// Wikipedia rejects requests without a browser-like agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Nominatim's usage policy requires an application-specific agent.
pub const GEOCODER_USER_AGENT: &str = "stadium_etl/0.1";

/// Settings for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Settings for the geocoding service.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: Url,
    pub user_agent: String,
    pub timeout: Duration,
    /// Minimum spacing between two lookups.
    pub min_interval: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.clone(),
            user_agent: GEOCODER_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            min_interval: Duration::from_secs(1),
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_url: String,
    pub output_dir: PathBuf,
    pub mailbox_dir: PathBuf,
    pub fetch: FetchConfig,
    pub geocoder: GeocoderConfig,
    /// Attempts granted to the extract stage before the run is abandoned.
    pub extract_attempts: u32,
    pub extract_retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            output_dir: PathBuf::from("data"),
            mailbox_dir: PathBuf::from("mailbox"),
            fetch: FetchConfig::default(),
            geocoder: GeocoderConfig::default(),
            extract_attempts: 3,
            extract_retry_delay: Duration::from_secs(5 * 60),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by whichever `STADIUM_*` / `GEOCODER_*` variables are set.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(url) = env::var("STADIUM_SOURCE_URL") {
            cfg.source_url = url;
        }
        if let Ok(dir) = env::var("STADIUM_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("STADIUM_MAILBOX_DIR") {
            cfg.mailbox_dir = PathBuf::from(dir);
        }
        if let Ok(endpoint) = env::var("GEOCODER_URL") {
            cfg.geocoder.endpoint = Url::parse(&endpoint)
                .with_context(|| format!("GEOCODER_URL is not a valid URL: {}", endpoint))?;
        }
        if let Ok(agent) = env::var("GEOCODER_USER_AGENT") {
            cfg.geocoder.user_agent = agent;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_etiquette() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.fetch.timeout, Duration::from_secs(15));
        assert_eq!(cfg.geocoder.min_interval, Duration::from_secs(1));
        assert_eq!(cfg.extract_attempts, 3);
        assert_eq!(cfg.extract_retry_delay, Duration::from_secs(300));
        assert!(cfg.fetch.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(cfg.geocoder.endpoint.as_str(), DEFAULT_GEOCODER_URL);
    }
}
