//! Tile Service for delivering tiles and archive metadata.
//!
//! The TileService is the main entry point for tile and metadata requests. It
//! orchestrates:
//! - Coordinate validation
//! - Bounded reads from the tile store
//! - Mapping archive misses and faults to [`TileError`]
//! - TileJSON and stats synthesis from metadata
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌───────────────────────┐     ┌─────────────────────────────┐  │
//! │  │     serve_tile()      │     │  tilejson() / tile_stats()  │  │
//! │  │  1. Parse z/x/y       │     │  1. Read metadata           │  │
//! │  │  2. Validate bounds   │     │  2. Degrade to empty        │  │
//! │  │  3. Read (timeout)    │     │  3. Apply defaults          │  │
//! │  └───────────────────────┘     └─────────────────────────────┘  │
//! │              │                               │                  │
//! │              ▼                               ▼                  │
//! │       ┌─────────────────────────────────────────────┐           │
//! │       │               TileStore                     │           │
//! │       └─────────────────────────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::archive::{ArchiveMetadata, TileCoord, TileStore};
use crate::error::{ArchiveError, TileError};

use super::layers::VectorLayerSchema;
use super::tilejson::{TileJson, TileStats};

/// Default bound on a single archive read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Content type of Mapbox Vector Tiles.
pub const TILE_CONTENT_TYPE: &str = "application/x-protobuf";

/// Tiles are stored gzip-compressed and served as-is.
pub const TILE_CONTENT_ENCODING: &str = "gzip";

/// Cache-Control max-age for tiles in seconds (15 minutes).
pub const TILE_CACHE_MAX_AGE: u32 = 900;

// =============================================================================
// Tile Service
// =============================================================================

/// Service for delivering tiles from a [`TileStore`].
///
/// # Type Parameters
///
/// * `S` - The tile store (e.g. [`MbtilesArchive`](crate::archive::MbtilesArchive))
///
/// # Example
///
/// ```ignore
/// use vector_tile_server::archive::{ArchiveOptions, MbtilesArchive};
/// use vector_tile_server::tile::TileService;
///
/// let archive = MbtilesArchive::open("berlin.mbtiles", ArchiveOptions::default()).await?;
/// let service = TileService::new(archive);
///
/// let tile = service.serve_tile("14", "8800", "5373").await?;
/// println!("Tile size: {} bytes", tile.len());
/// ```
pub struct TileService<S: TileStore> {
    /// The archive tiles are read from
    store: Arc<S>,

    /// Upper bound on each store call
    read_timeout: Duration,

    /// Layers declared in TileJSON
    schema: VectorLayerSchema,
}

impl<S: TileStore> TileService<S> {
    /// Create a new tile service with default settings.
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    /// Create a new tile service over a shared store.
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            read_timeout: DEFAULT_READ_TIMEOUT,
            schema: VectorLayerSchema::default(),
        }
    }

    /// Set the bound on each archive read.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Replace the declared vector layer schema.
    pub fn with_layer_schema(mut self, schema: VectorLayerSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The declared vector layer schema.
    pub fn layer_schema(&self) -> &VectorLayerSchema {
        &self.schema
    }

    /// Parse, validate and fetch a tile addressed by raw path segments.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidCoordinate`] for non-integer or out-of-grid x/y
    /// - [`TileError::InvalidZoom`] for zoom outside 0-18
    /// - [`TileError::NotFound`] if the archive has no such tile
    /// - [`TileError::Archive`] if the archive could not be read
    pub async fn serve_tile(&self, z: &str, x: &str, y: &str) -> Result<Bytes, TileError> {
        let coord = TileCoord::parse(z, x, y)?;
        self.get_tile(coord).await
    }

    /// Fetch a validated tile.
    ///
    /// The payload is returned exactly as stored; it is never decompressed
    /// or recompressed.
    pub async fn get_tile(&self, coord: TileCoord) -> Result<Bytes, TileError> {
        match self.bounded(self.store.tile(coord)).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => {
                debug!(z = coord.z(), x = coord.x(), y = coord.y(), "Tile not found");
                Err(TileError::NotFound {
                    z: coord.z(),
                    x: coord.x(),
                    y: coord.y(),
                })
            }
            Err(e) => {
                error!(
                    z = coord.z(),
                    x = coord.x(),
                    y = coord.y(),
                    archive = self.store.identifier(),
                    "Error reading tile: {}",
                    e
                );
                Err(TileError::Archive(e))
            }
        }
    }

    /// Read archive metadata, degrading to an empty set on failure.
    pub async fn metadata(&self) -> ArchiveMetadata {
        match self.bounded(self.store.metadata()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    archive = self.store.identifier(),
                    "Error reading metadata, using defaults: {}", e
                );
                ArchiveMetadata::default()
            }
        }
    }

    /// Raw metadata plus parsed bounds and zoom range.
    pub async fn tile_stats(&self) -> TileStats {
        TileStats::from_metadata(self.metadata().await)
    }

    /// Build the TileJSON document for the given tile endpoint.
    pub async fn tilejson(&self, tiles_base_url: &str) -> TileJson {
        let metadata = self.metadata().await;
        TileJson::build(&metadata, tiles_base_url, &self.schema)
    }

    /// Run a store call under the read timeout.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ArchiveError>>,
    ) -> Result<T, ArchiveError> {
        match tokio::time::timeout(self.read_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ArchiveError::Timeout {
                millis: self.read_timeout.as_millis() as u64,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
