// src/transform/mod.rs

use std::collections::HashSet;
use tracing::{info, instrument};

use crate::geocode::{locate, Geocoder};
use crate::record::{Coordinates, ExtractedStadium, StadiumRecord, NO_IMAGE};

/// Parse a capacity cell. Separators are ignored, decimals are truncated and
/// anything unparseable or negative becomes 0.
pub fn parse_capacity(raw: &str) -> u64 {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if let Ok(n) = cleaned.parse::<u64>() {
        return n;
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

/// Collapse every "no picture" spelling to [`NO_IMAGE`].
pub fn normalize_image(raw: &str) -> String {
    match raw {
        "" | "NO_IMAGE" => NO_IMAGE.to_string(),
        url => url.to_string(),
    }
}

/// Indices of records whose location repeats an earlier record's.
/// Missing locations count as equal to each other.
pub fn duplicate_locations(records: &[StadiumRecord]) -> Vec<usize> {
    let mut seen: HashSet<Option<(u64, u64)>> = HashSet::new();
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| !seen.insert(r.location.as_ref().map(Coordinates::key)))
        .map(|(i, _)| i)
        .collect()
}

/// Geocode every stadium by name, clean image and capacity, then re-geocode
/// colliding stadiums by city.
///
/// Lookups run one after another; throttling is the geocoder's concern.
#[instrument(level = "info", skip_all, fields(rows = rows.len()))]
pub async fn enrich(rows: Vec<ExtractedStadium>, geocoder: &dyn Geocoder) -> Vec<StadiumRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let location = locate(geocoder, &row.country, &row.stadium).await;
        records.push(StadiumRecord {
            capacity: parse_capacity(&row.capacity),
            images: normalize_image(&row.images),
            location,
            rank: row.rank,
            stadium: row.stadium,
            region: row.region,
            country: row.country,
            city: row.city,
            home_team: row.home_team,
        });
    }

    let duplicates = duplicate_locations(&records);
    info!(
        resolved = records.iter().filter(|r| r.location.is_some()).count(),
        duplicates = duplicates.len(),
        "stadium geocoding done"
    );

    for idx in duplicates {
        let record = &mut records[idx];
        // an unresolved fallback keeps whatever the stadium lookup found
        if let Some(coords) = locate(geocoder, &record.country, &record.city).await {
            record.location = Some(coords);
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    struct FakeGeocoder {
        places: HashMap<&'static str, Coordinates>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(places: &[(&'static str, (f64, f64))]) -> Self {
            Self {
                places: places.iter().map(|(q, c)| (*q, Coordinates::from(*c))).collect(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.places.get(query).copied())
        }
    }

    fn row(stadium: &str, country: &str, city: &str) -> ExtractedStadium {
        ExtractedStadium {
            rank: "1".into(),
            stadium: stadium.into(),
            capacity: "50000".into(),
            region: "Europe".into(),
            country: country.into(),
            city: city.into(),
            images: "https://upload.wikimedia.org/a.png".into(),
            home_team: "Team".into(),
        }
    }

    #[test]
    fn capacity_parsing() {
        assert_eq!(parse_capacity("90,000"), 90000);
        assert_eq!(parse_capacity("90000"), 90000);
        assert_eq!(parse_capacity("N/A"), 0);
        assert_eq!(parse_capacity(""), 0);
        assert_eq!(parse_capacity("-500"), 0);
        assert_eq!(parse_capacity("12345.9"), 12345);
    }

    #[test]
    fn image_sentinels() {
        assert_eq!(normalize_image(""), NO_IMAGE);
        assert_eq!(normalize_image("NO_IMAGE"), NO_IMAGE);
        assert_eq!(
            normalize_image("https://upload.wikimedia.org/x.png"),
            "https://upload.wikimedia.org/x.png"
        );
    }

    #[tokio::test]
    async fn only_the_second_collision_is_requeried_by_city() {
        let geocoder = FakeGeocoder::new(&[
            ("National Stadium, Poland", (52.24, 21.04)),
            ("National Stadium, Jamaica", (52.24, 21.04)),
            ("Kingston, Jamaica", (17.99, -76.79)),
            ("Anfield, England", (53.43, -2.96)),
        ]);
        let rows = vec![
            row("National Stadium", "Poland", "Warsaw"),
            row("Anfield", "England", "Liverpool"),
            row("National Stadium", "Jamaica", "Kingston"),
        ];

        let records = enrich(rows, &geocoder).await;

        assert_eq!(
            geocoder.queries(),
            vec![
                "National Stadium, Poland",
                "Anfield, England",
                "National Stadium, Jamaica",
                "Kingston, Jamaica",
            ]
        );
        assert_eq!(records[0].location, Some(Coordinates::new(52.24, 21.04)));
        assert_eq!(records[1].location, Some(Coordinates::new(53.43, -2.96)));
        assert_eq!(records[2].location, Some(Coordinates::new(17.99, -76.79)));
    }

    #[tokio::test]
    async fn unresolved_lookups_stay_empty_and_retry_by_city() {
        let geocoder = FakeGeocoder::new(&[("Lagos, Nigeria", (6.45, 3.39))]);
        let rows = vec![
            row("Unknown Ground", "Ghana", "Nowhere"),
            row("Teslim Balogun", "Nigeria", "Lagos"),
        ];

        let records = enrich(rows, &geocoder).await;

        // both stadium lookups miss; the second miss collides with the first
        assert_eq!(records[0].location, None);
        assert_eq!(records[1].location, Some(Coordinates::new(6.45, 3.39)));
        assert_eq!(geocoder.queries().len(), 3);
    }

    #[tokio::test]
    async fn failed_fallback_keeps_stadium_location() {
        let geocoder = FakeGeocoder::new(&[
            ("Arena, A", (1.0, 1.0)),
            ("Arena, B", (1.0, 1.0)),
        ]);
        let records = enrich(vec![row("Arena", "A", "x"), row("Arena", "B", "y")], &geocoder).await;
        assert_eq!(records[1].location, Some(Coordinates::new(1.0, 1.0)));
    }

    #[tokio::test]
    async fn signed_zero_locations_collide() {
        let geocoder = FakeGeocoder::new(&[
            ("Equator Ground, A", (0.0, 9.5)),
            ("Equator Ground, B", (-0.0, 9.5)),
        ]);
        let rows = vec![row("Equator Ground", "A", "x"), row("Equator Ground", "B", "y")];

        let records = enrich(rows, &geocoder).await;

        assert_eq!(duplicate_locations(&records), vec![1]);
        assert_eq!(geocoder.queries().last().map(String::as_str), Some("y, B"));
    }

    #[tokio::test]
    async fn cleans_capacity_and_images() {
        let geocoder = FakeGeocoder::new(&[]);
        let mut raw = row("Somewhere", "X", "Y");
        raw.capacity = "1,200".into();
        raw.images = String::new();

        let records = enrich(vec![raw], &geocoder).await;
        assert_eq!(records[0].capacity, 1200);
        assert_eq!(records[0].images, NO_IMAGE);
    }
}
