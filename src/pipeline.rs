// src/pipeline.rs

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::{
    config::PipelineConfig,
    extract, fetch,
    geocode::Geocoder,
    load,
    mailbox::{Mailbox, MemoryMailbox},
    record::{ExtractedStadium, StadiumRecord},
    transform,
};

pub const EXTRACT_TASK: &str = "extract_data_from_wikipedia";
pub const TRANSFORM_TASK: &str = "transform_wikipedia_data";
pub const LOAD_TASK: &str = "write_wikipedia_data";
pub const ROWS_KEY: &str = "rows";

/// Stage 1: fetch the page, extract stadium rows and publish them.
/// Returns the number of rows published.
#[instrument(level = "info", skip(client, mailbox))]
pub async fn extract_stage(client: &Client, url: &str, mailbox: &dyn Mailbox) -> Result<usize> {
    let Some(html) = fetch::get_page(client, url).await else {
        bail!("Wikipedia page could not be fetched: {}", url);
    };
    publish_extracted(&html, mailbox)
}

/// Extract stadium rows from already-fetched markup and publish them.
pub fn publish_extracted(html: &str, mailbox: &dyn Mailbox) -> Result<usize> {
    let stadiums = extract::extract_stadiums(Some(html));
    let json = serde_json::to_string(&stadiums).context("serializing extracted rows")?;
    mailbox.push(EXTRACT_TASK, ROWS_KEY, json)?;
    if stadiums.is_empty() {
        warn!("no stadium rows extracted");
    }
    Ok(stadiums.len())
}

/// Stage 1 with the run's retry policy applied.
pub async fn extract_with_retries(
    client: &Client,
    cfg: &PipelineConfig,
    mailbox: &dyn Mailbox,
) -> Result<usize> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match extract_stage(client, &cfg.source_url, mailbox).await {
            Ok(n) => return Ok(n),
            Err(e) if attempt < cfg.extract_attempts => {
                warn!(
                    attempt,
                    max = cfg.extract_attempts,
                    delay_s = cfg.extract_retry_delay.as_secs_f64(),
                    error = %e,
                    "extract failed, retrying"
                );
                sleep(cfg.extract_retry_delay).await;
            }
            Err(e) => {
                error!(attempt, error = %e, "extract exhausted retries");
                return Err(e);
            }
        }
    }
}

/// Stage 2: geocode and clean the extracted rows, then publish the records.
#[instrument(level = "info", skip_all)]
pub async fn transform_stage(geocoder: &dyn Geocoder, mailbox: &dyn Mailbox) -> Result<usize> {
    let rows: Vec<ExtractedStadium> = pull_rows(mailbox, EXTRACT_TASK)?;
    let records = transform::enrich(rows, geocoder).await;
    let json = serde_json::to_string(&records).context("serializing transformed records")?;
    mailbox.push(TRANSFORM_TASK, ROWS_KEY, json)?;
    Ok(records.len())
}

/// Stage 3: write the transformed records to a timestamped CSV in `out_dir`.
#[instrument(level = "info", skip(mailbox, out_dir))]
pub fn load_stage(
    mailbox: &dyn Mailbox,
    out_dir: impl AsRef<Path>,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let records: Vec<StadiumRecord> = pull_rows(mailbox, TRANSFORM_TASK)?;
    load::write_stadiums(&records, out_dir, now)
}

/// Run all three stages in order against an in-memory mailbox.
pub async fn run(cfg: &PipelineConfig, geocoder: &dyn Geocoder) -> Result<PathBuf> {
    let mailbox = MemoryMailbox::new();
    let client = fetch::build_client(&cfg.fetch)?;

    let extracted = extract_with_retries(&client, cfg, &mailbox).await?;
    info!(rows = extracted, "extract stage done");

    let transformed = transform_stage(geocoder, &mailbox).await?;
    info!(rows = transformed, "transform stage done");

    let path = load_stage(&mailbox, &cfg.output_dir, Local::now())?;
    info!(path = %path.display(), "load stage done");
    Ok(path)
}

/// An absent payload is an error; an empty list is not.
fn pull_rows<T: DeserializeOwned>(mailbox: &dyn Mailbox, task_id: &str) -> Result<Vec<T>> {
    let Some(json) = mailbox.pull(task_id, ROWS_KEY)? else {
        bail!("No data received from {}", task_id);
    };
    serde_json::from_str(&json).with_context(|| format!("decoding rows from {}", task_id))
}
