// src/extract/mod.rs

pub mod clean;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::record::{ExtractedStadium, NO_IMAGE};
use clean::{clean_capacity, clean_text};

/// Rank, stadium, capacity, region, country, city, images, home team.
pub const MIN_CELLS: usize = 8;

/// Text a table must contain to be taken as the stadium list.
const TABLE_MARKER: &str = "Stadium";

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.wikitable").expect("table selector should parse"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector should parse"));
// the rank column is sometimes rendered as a header cell
static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("cell selector should parse"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("img selector should parse"));

/// First `wikitable` whose text mentions stadiums.
pub fn stadium_table(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&TABLE)
        .find(|table| table.text().collect::<String>().contains(TABLE_MARKER))
}

/// Rows of the stadium table, header row first. Empty when no table matches.
pub fn stadium_rows(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    stadium_table(doc)
        .into_iter()
        .flat_map(|table| table.select(&ROW))
}

/// Turn raw table rows into stadium rows.
///
/// The first row is the header and is skipped. Rows with fewer than
/// [`MIN_CELLS`] cells are dropped without a trace; rows that fail to
/// extract are logged with their 1-based index and dropped.
pub fn normalize_rows<'a, I>(rows: I) -> Vec<ExtractedStadium>
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    let mut out = Vec::new();
    for (idx, row) in rows.into_iter().enumerate().skip(1) {
        let cells: Vec<ElementRef<'a>> = row.select(&CELL).collect();
        if cells.len() < MIN_CELLS {
            debug!(row = idx, cells = cells.len(), "short row skipped");
            continue;
        }
        match stadium_from_cells(&cells) {
            Ok(stadium) => out.push(stadium),
            Err(e) => warn!(row = idx, error = %e, "Error parsing row"),
        }
    }
    out
}

/// Parse `html` and return every stadium row found. Absent markup yields no rows.
pub fn extract_stadiums(html: Option<&str>) -> Vec<ExtractedStadium> {
    let Some(html) = html else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let stadiums = normalize_rows(stadium_rows(&doc));
    info!(count = stadiums.len(), "extracted stadium rows");
    stadiums
}

fn stadium_from_cells(cells: &[ElementRef<'_>]) -> Result<ExtractedStadium> {
    let text = |i: usize| clean_text(&cell_text(&cells[i]));

    Ok(ExtractedStadium {
        rank: text(0),
        stadium: text(1),
        capacity: clean_capacity(&cell_text(&cells[2])),
        region: text(3),
        country: text(4),
        city: text(5),
        images: image_url(&cells[6])?,
        home_team: text(7),
    })
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect()
}

/// Protocol-relative `src` of the first image in `cell`, made absolute.
fn image_url(cell: &ElementRef<'_>) -> Result<String> {
    match cell.select(&IMG).next() {
        None => Ok(NO_IMAGE.to_string()),
        Some(img) => img
            .value()
            .attr("src")
            .map(|src| format!("https:{}", src))
            .ok_or_else(|| anyhow!("image element without src")),
    }
}
