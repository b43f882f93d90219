// src/record.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stand-in for a row whose image cell carries no picture.
pub const NO_IMAGE: &str = "upload.wikimedia.org";

/// One stadium row as it leaves the normalizer. Every field is still text;
/// `capacity` has had its thousands separators removed but is not parsed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedStadium {
    #[serde(deserialize_with = "lenient_text")]
    pub rank: String,
    #[serde(deserialize_with = "lenient_text")]
    pub stadium: String,
    #[serde(deserialize_with = "lenient_text")]
    pub capacity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub region: String,
    #[serde(deserialize_with = "lenient_text")]
    pub country: String,
    #[serde(deserialize_with = "lenient_text")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub images: String,
    #[serde(deserialize_with = "lenient_text")]
    pub home_team: String,
}

/// A fully transformed stadium, ready for the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StadiumRecord {
    pub rank: String,
    pub stadium: String,
    pub capacity: u64,
    pub region: String,
    pub country: String,
    pub city: String,
    pub images: String,
    pub home_team: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

/// Latitude/longitude pair. Serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Bitwise key used to detect two rows resolving to the same point.
    /// `-0.0` and `0.0` share a key.
    pub fn key(&self) -> (u64, u64) {
        (zero_signless(self.latitude).to_bits(), zero_signless(self.longitude).to_bits())
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(c: Coordinates) -> Self {
        (c.latitude, c.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.latitude, self.longitude)
    }
}

fn zero_signless(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Accept strings, numbers and nulls where text is expected; upstream
/// payloads are not always produced by this crate.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
