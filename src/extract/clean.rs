// src/extract/clean.rs

/// Annotations trailing a cell's real value, checked in this order.
const TRAILING_MARKERS: [&str; 3] = [" ♦", "[", " (formerly)"];

/// Trim a cell's text, drop line breaks and cut off footnotes and notes.
///
/// Each marker is applied in turn: if it occurs, everything from its first
/// occurrence onwards is discarded.
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.trim().replace('\n', "");
    for marker in TRAILING_MARKERS {
        if let Some(idx) = text.find(marker) {
            text.truncate(idx);
        }
    }
    text.trim().to_string()
}

/// `clean_text` plus removal of thousands separators. Parsing to a number
/// happens in the transform stage.
pub fn clean_capacity(raw: &str) -> String {
    clean_text(raw).replace(',', "")
}
