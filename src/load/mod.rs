// src/load/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use crate::record::StadiumRecord;

pub const COLUMNS: [&str; 9] = [
    "rank",
    "stadium",
    "capacity",
    "region",
    "country",
    "city",
    "images",
    "home_team",
    "location",
];

/// Flat view of a record; CSV cells cannot hold nested values.
#[derive(Serialize)]
struct CsvRow<'a> {
    rank: &'a str,
    stadium: &'a str,
    capacity: u64,
    region: &'a str,
    country: &'a str,
    city: &'a str,
    images: &'a str,
    home_team: &'a str,
    location: String,
}

impl<'a> From<&'a StadiumRecord> for CsvRow<'a> {
    fn from(r: &'a StadiumRecord) -> Self {
        Self {
            rank: &r.rank,
            stadium: &r.stadium,
            capacity: r.capacity,
            region: &r.region,
            country: &r.country,
            city: &r.city,
            images: &r.images,
            home_team: &r.home_team,
            location: r.location.map(|c| c.to_string()).unwrap_or_default(),
        }
    }
}

/// `stadium_cleaned_<YYYY-MM-DD>_<HH_MM_SS.ffffff>.csv`; the time keeps no colons.
pub fn output_file_name(now: DateTime<Local>) -> String {
    format!(
        "stadium_cleaned_{}_{}.csv",
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S%.6f").to_string().replace(':', "_")
    )
}

/// Write `records` as CSV into `out_dir` and return the file's path.
/// An empty slice still produces a file holding only the header.
#[instrument(level = "info", skip(records, out_dir), fields(dir = %out_dir.as_ref().display()))]
pub fn write_stadiums(
    records: &[StadiumRecord],
    out_dir: impl AsRef<Path>,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;
    let path = out_dir.join(output_file_name(now));

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("creating {:?}", &path))?;
    wtr.write_record(COLUMNS).context("writing CSV header")?;
    for record in records {
        wtr.serialize(CsvRow::from(record))
            .with_context(|| format!("writing row for {}", record.stadium))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", &path))?;

    info!(rows = records.len(), path = %path.display(), "wrote stadium file");
    Ok(path)
}
