//! Tile service layer.
//!
//! This module delivers pre-built vector tiles and the service metadata that
//! describes them.
//!
//! # Components
//!
//! - [`TileService`]: Validates tile addresses, reads the archive under a timeout
//!   and maps misses/faults to [`TileError`](crate::error::TileError)
//! - [`TileJson`]: TileJSON 3.0.0 document synthesized from archive metadata
//! - [`TileStats`]: Raw metadata plus parsed bounds and zoom range
//! - [`VectorLayerSchema`]: The declared `vector_layers` configuration
//!
//! # Example
//!
//! ```
//! use vector_tile_server::archive::ArchiveMetadata;
//! use vector_tile_server::tile::{TileJson, VectorLayerSchema, FALLBACK_BOUNDS};
//!
//! let metadata = ArchiveMetadata::from_rows([("name", "Berlin")]);
//! let doc = TileJson::build(&metadata, "http://localhost:8080/tiles/", &VectorLayerSchema::default());
//!
//! assert_eq!(doc.name, "Berlin");
//! assert_eq!(doc.bounds, FALLBACK_BOUNDS);
//! assert_eq!(doc.tiles[0], "http://localhost:8080/tiles/{z}/{x}/{y}.mvt");
//! ```

mod layers;
mod service;
mod tilejson;

pub use layers::{VectorLayer, VectorLayerSchema, DEFAULT_SCHEMA_VERSION};
pub use service::{
    TileService, DEFAULT_READ_TIMEOUT, TILE_CACHE_MAX_AGE, TILE_CONTENT_ENCODING,
    TILE_CONTENT_TYPE,
};
pub use tilejson::{
    midpoint, tile_url_template, TileJson, TileStats, DEFAULT_ATTRIBUTION, DEFAULT_CENTER_ZOOM,
    DEFAULT_DESCRIPTION, DEFAULT_NAME, DEFAULT_VERSION, FALLBACK_BOUNDS, TILEJSON_VERSION,
};
