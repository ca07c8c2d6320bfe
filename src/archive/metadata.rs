//! Parsed view over the MBTiles `metadata` table.

use std::collections::BTreeMap;

use serde::Serialize;

/// Zoom range used when `minzoom`/`maxzoom` are missing or unparsable.
pub const DEFAULT_ZOOM_RANGE: (u8, u8) = (0, 14);

/// Key/value rows from the archive's `metadata` table.
///
/// Rows are kept verbatim; typed accessors parse on demand and fall back to
/// `None` (or a default) rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArchiveMetadata {
    rows: BTreeMap<String, String>,
}

impl ArchiveMetadata {
    /// Create metadata from `(name, value)` rows.
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Iterate rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `bounds` as `[minlon, minlat, maxlon, maxlat]`.
    pub fn bounds(&self) -> Option<[f64; 4]> {
        self.get("bounds").and_then(parse_floats::<4>)
    }

    /// `center` as `[lon, lat, zoom]`.
    pub fn center(&self) -> Option<[f64; 3]> {
        self.get("center").and_then(parse_floats::<3>)
    }

    /// `(minzoom, maxzoom)`.
    ///
    /// A missing key takes its half of [`DEFAULT_ZOOM_RANGE`]; an unparsable
    /// value in either key resets both to the default.
    pub fn zoom_range(&self) -> (u8, u8) {
        let (default_min, default_max) = DEFAULT_ZOOM_RANGE;

        let parse = |key: &str, default: u8| match self.get(key) {
            None => Some(default),
            Some(value) => value.trim().parse::<u8>().ok(),
        };

        match (parse("minzoom", default_min), parse("maxzoom", default_max)) {
            (Some(min), Some(max)) => (min, max),
            _ => DEFAULT_ZOOM_RANGE,
        }
    }
}

/// Parse exactly `N` comma-separated floats.
fn parse_floats<const N: usize>(value: &str) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    let mut parts = value.split(',');

    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(out)
}
