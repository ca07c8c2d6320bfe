//! TileJSON synthesis.
//!
//! Builds a [TileJSON 3.0.0](https://github.com/mapbox/tilejson-spec) document
//! from archive metadata. Missing `bounds` and `center` are filled with
//! defaults rather than reported as errors.

use serde::Serialize;

use crate::archive::ArchiveMetadata;

use super::layers::{VectorLayer, VectorLayerSchema};

/// TileJSON version emitted.
pub const TILEJSON_VERSION: &str = "3.0.0";

/// Bounds used when the archive has none (Berlin).
pub const FALLBACK_BOUNDS: [f64; 4] = [13.0882, 52.3382, 13.7606, 52.6755];

/// Zoom assigned to a center computed from bounds.
pub const DEFAULT_CENTER_ZOOM: f64 = 10.0;

pub const DEFAULT_NAME: &str = "Local OSM Vector Tiles";
pub const DEFAULT_DESCRIPTION: &str = "Vector tiles generated from local OpenStreetMap data";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// URL suffix appended to the tile endpoint.
pub const TILE_URL_TEMPLATE: &str = "{z}/{x}/{y}.mvt";

/// A TileJSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileJson {
    pub tilejson: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub attribution: String,
    pub scheme: String,
    pub tiles: Vec<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub bounds: [f64; 4],
    pub center: [f64; 3],
    pub vector_layers: Vec<VectorLayer>,
}

impl TileJson {
    /// Build the document.
    ///
    /// `tiles_base_url` is the tile endpoint (e.g. `http://host/tiles/`);
    /// `{z}/{x}/{y}.mvt` is appended to it.
    pub fn build(metadata: &ArchiveMetadata, tiles_base_url: &str, schema: &VectorLayerSchema) -> Self {
        let (minzoom, maxzoom) = metadata.zoom_range();
        let bounds = metadata.bounds().unwrap_or(FALLBACK_BOUNDS);
        let center = metadata.center().unwrap_or_else(|| midpoint(&bounds));

        let text = |key: &str, default: &str| metadata.get(key).unwrap_or(default).to_string();

        Self {
            tilejson: TILEJSON_VERSION.to_string(),
            name: text("name", DEFAULT_NAME),
            description: text("description", DEFAULT_DESCRIPTION),
            version: text("version", DEFAULT_VERSION),
            attribution: text("attribution", DEFAULT_ATTRIBUTION),
            scheme: "xyz".to_string(),
            tiles: vec![tile_url_template(tiles_base_url)],
            minzoom,
            maxzoom,
            bounds,
            center,
            vector_layers: schema.layers.clone(),
        }
    }
}

/// Center of `bounds` at [`DEFAULT_CENTER_ZOOM`].
pub fn midpoint(bounds: &[f64; 4]) -> [f64; 3] {
    [
        (bounds[0] + bounds[2]) / 2.0,
        (bounds[1] + bounds[3]) / 2.0,
        DEFAULT_CENTER_ZOOM,
    ]
}

/// Append `{z}/{x}/{y}.mvt` to a tile endpoint, inserting a `/` if needed.
pub fn tile_url_template(tiles_base_url: &str) -> String {
    if tiles_base_url.ends_with('/') {
        format!("{}{}", tiles_base_url, TILE_URL_TEMPLATE)
    } else {
        format!("{}/{}", tiles_base_url, TILE_URL_TEMPLATE)
    }
}

/// Diagnostic summary: raw metadata plus parsed bounds and zoom range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileStats {
    pub metadata: ArchiveMetadata,
    pub bounds: Option<[f64; 4]>,
    pub minzoom: u8,
    pub maxzoom: u8,
}

impl TileStats {
    pub fn from_metadata(metadata: ArchiveMetadata) -> Self {
        let bounds = metadata.bounds();
        let (minzoom, maxzoom) = metadata.zoom_range();
        Self {
            metadata,
            bounds,
            minzoom,
            maxzoom,
        }
    }
}
