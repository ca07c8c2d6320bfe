//! Declared vector layer schema.
//!
//! TileJSON's `vector_layers` describes which layers the tiles contain. The
//! schema here is service configuration, not derived from the archive: it
//! must be kept in step with whatever layer set the archive was built with.
//! Nothing checks the two against each other.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Version tag of the built-in schema.
pub const DEFAULT_SCHEMA_VERSION: &str = "openmaptiles-basic/1";

/// One entry of TileJSON's `vector_layers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
    /// Layer name as encoded in the tiles
    pub id: String,

    #[serde(default)]
    pub description: String,

    pub minzoom: u8,
    pub maxzoom: u8,

    /// Attribute name -> description
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl VectorLayer {
    fn new(id: &str, description: &str, minzoom: u8, maxzoom: u8, fields: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            minzoom,
            maxzoom,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// A versioned set of vector layer declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayerSchema {
    pub version: String,
    pub layers: Vec<VectorLayer>,
}

impl Default for VectorLayerSchema {
    /// The layers produced by the OpenMapTiles-style Berlin build:
    /// `transportation`, `building`, `water`, `landuse` and `poi`.
    fn default() -> Self {
        Self {
            version: DEFAULT_SCHEMA_VERSION.to_string(),
            layers: vec![
                VectorLayer::new(
                    "transportation",
                    "Road network",
                    4,
                    14,
                    &[
                        ("class", "Road type"),
                        ("name", "Road name"),
                        ("ref", "Road reference"),
                        ("oneway", "One-way indicator"),
                        ("brunnel", "Bridge/tunnel indicator"),
                    ],
                ),
                VectorLayer::new(
                    "building",
                    "Building footprints",
                    13,
                    14,
                    &[
                        ("class", "Building type"),
                        ("name", "Building name"),
                        ("height", "Building height"),
                    ],
                ),
                VectorLayer::new(
                    "water",
                    "Water features",
                    0,
                    14,
                    &[("class", "Water type"), ("name", "Water feature name")],
                ),
                VectorLayer::new(
                    "landuse",
                    "Land use areas",
                    4,
                    14,
                    &[("class", "Land use type"), ("name", "Area name")],
                ),
                VectorLayer::new(
                    "poi",
                    "Points of interest",
                    12,
                    14,
                    &[("class", "POI type"), ("name", "POI name")],
                ),
            ],
        }
    }
}

impl VectorLayerSchema {
    /// Load a schema from a JSON file.
    ///
    /// The file has the same shape as the serialized schema:
    /// `{"version": "...", "layers": [{"id": ..., "minzoom": ..., ...}]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let schema: Self = serde_json::from_str(&text)
            .map_err(|e| format!("invalid vector layer schema {}: {}", path.display(), e))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check that layer ids are unique and zoom ranges are ordered.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for layer in &self.layers {
            if layer.id.is_empty() {
                return Err("vector layer id must not be empty".to_string());
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(format!("duplicate vector layer id: {}", layer.id));
            }
            if layer.minzoom > layer.maxzoom {
                return Err(format!(
                    "vector layer {} has minzoom {} > maxzoom {}",
                    layer.id, layer.minzoom, layer.maxzoom
                ));
            }
        }
        Ok(())
    }

    /// Layer ids in declaration order.
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }
}
