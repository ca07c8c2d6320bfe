//! # Vector Tile Server
//!
//! Serves a pre-built MBTiles archive to web map clients.
//!
//! This library reads individually addressed Mapbox Vector Tiles from a
//! read-only SQLite archive, synthesizes a TileJSON capability document from
//! the archive's metadata, resolves font glyph ranges from a directory of
//! pre-rendered `.pbf` files and rewrites a base map style so that its tile
//! source and glyphs point at this server.
//!
//! ## Features
//!
//! - **Verbatim tile delivery**: Tiles are stored gzip-compressed and served as-is
//! - **XYZ addressing**: Web tile rows are translated to the archive's TMS rows
//! - **TileJSON 3.0.0**: Bounds, center and zoom range with documented fallbacks
//! - **Font stacks**: Comma-separated stacks resolved in order of preference
//! - **Local styles**: Vector source and glyph URLs rewritten, sprites dropped
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`archive`] - MBTiles reader, tile addressing and metadata parsing
//! - [`tile`] - Tile service, TileJSON and vector layer schema
//! - [`font`] - Glyph range resolver
//! - [`style`] - Style rewriter and catalog
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use vector_tile_server::{
//!     create_router, ArchiveOptions, GlyphResolver, MbtilesArchive, RouterConfig,
//!     StyleRewriter, TileService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archive = MbtilesArchive::open("berlin.mbtiles", ArchiveOptions::default()).await?;
//!
//!     let router = create_router(
//!         TileService::new(archive),
//!         GlyphResolver::new("static/font"),
//!         StyleRewriter::new("static/style-cdn.json", "http://localhost:8080"),
//!         RouterConfig::default(),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod font;
pub mod server;
pub mod style;
pub mod tile;

// Re-export commonly used types
pub use archive::{
    ArchiveMetadata, ArchiveOptions, ArchiveSummary, MbtilesArchive, TileCoord, TileStore,
    MAX_ZOOM,
};
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::{ArchiveError, GlyphError, StyleError, TileError};
pub use font::{FontEntry, GlyphResolver};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use style::{StyleCatalog, StyleRewriter};
pub use tile::{TileJson, TileService, TileStats, VectorLayer, VectorLayerSchema};
