//! MBTiles archive reader backed by a read-only SQLite pool.
//!
//! An MBTiles file is a SQLite database with two relations:
//!
//! - `metadata(name, value)`: service-level key/value pairs
//! - `tiles(zoom_level, tile_column, tile_row, tile_data)`: one row per tile,
//!   with `tile_row` in TMS orientation
//!
//! The archive is never written by this crate. Connections are opened with
//! `SQLITE_OPEN_READONLY` and shared through a small pool so concurrent
//! requests each get their own handle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, instrument};

use crate::error::ArchiveError;

use super::coord::TileCoord;
use super::metadata::ArchiveMetadata;
use super::store::TileStore;

/// Default number of pooled read handles.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Default time to wait for a free handle from the pool.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of sample rows reported by [`MbtilesArchive::inspect`].
const SAMPLE_TILE_COUNT: i64 = 5;

// =============================================================================
// Options
// =============================================================================

/// Options for opening an archive.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Maximum number of simultaneously open read handles
    pub max_connections: u32,

    /// How long a request may wait for a free handle
    pub acquire_timeout: Duration,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl ArchiveOptions {
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

// =============================================================================
// Archive
// =============================================================================

/// A read-only MBTiles archive.
///
/// # Example
///
/// ```ignore
/// use vector_tile_server::archive::{ArchiveOptions, MbtilesArchive, TileCoord};
///
/// let archive = MbtilesArchive::open("berlin.mbtiles", ArchiveOptions::default()).await?;
/// let tile = archive.get_tile(TileCoord::new(14, 8800, 5373)?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MbtilesArchive {
    pool: SqlitePool,
    path: PathBuf,
    identifier: String,
}

impl MbtilesArchive {
    /// Open the archive at `path`.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::NotFound`] if no file exists at `path`
    /// - [`ArchiveError::Database`] if the file cannot be opened as SQLite
    pub async fn open(path: impl AsRef<Path>, options: ArchiveOptions) -> Result<Self, ArchiveError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ArchiveError::NotFound(path.to_path_buf()));
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        // Connecting eagerly surfaces a corrupt or non-SQLite file at startup
        // instead of on the first request.
        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections.max(1))
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await?;

        debug!(
            path = %path.display(),
            max_connections = options.max_connections,
            "Opened MBTiles archive"
        );

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            identifier: path.display().to_string(),
        })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch a tile by XYZ address.
    ///
    /// The row is flipped to TMS before the lookup. Returns the stored bytes
    /// verbatim, or `None` if the archive has no such tile.
    #[instrument(skip(self), fields(z = coord.z(), x = coord.x(), y = coord.y()))]
    pub async fn get_tile(&self, coord: TileCoord) -> Result<Option<Bytes>, ArchiveError> {
        let y_tms = coord.tms_row();

        // A row whose tile_data is NULL counts as absent
        let row: Option<Option<Vec<u8>>> = sqlx::query_scalar(
            "SELECT tile_data FROM tiles WHERE zoom_level = ? AND tile_column = ? AND tile_row = ?",
        )
        .bind(i64::from(coord.z()))
        .bind(i64::from(coord.x()))
        .bind(i64::from(y_tms))
        .fetch_optional(&self.pool)
        .await?;

        match row.flatten() {
            Some(data) => {
                debug!(y_tms, bytes = data.len(), "Found tile");
                Ok(Some(Bytes::from(data)))
            }
            None => {
                debug!(y_tms, "Tile not in archive");
                Ok(None)
            }
        }
    }

    /// Read every row of the metadata table.
    ///
    /// Rows with a NULL value are skipped.
    pub async fn get_metadata(&self) -> Result<ArchiveMetadata, ArchiveError> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT name, value FROM metadata")
                .fetch_all(&self.pool)
                .await?;

        Ok(ArchiveMetadata::from_rows(
            rows.into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        ))
    }

    /// Summarise the archive's structure and contents.
    ///
    /// Missing relations are reported in the summary rather than as errors.
    pub async fn inspect(&self) -> Result<ArchiveSummary, ArchiveError> {
        let relations: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name IN ('metadata', 'tiles')",
        )
        .fetch_all(&self.pool)
        .await?;

        let has_metadata_table = relations.iter().any(|r| r == "metadata");
        let has_tiles_table = relations.iter().any(|r| r == "tiles");

        let metadata = if has_metadata_table {
            self.get_metadata().await?
        } else {
            ArchiveMetadata::default()
        };

        let mut summary = ArchiveSummary {
            path: self.path.clone(),
            has_metadata_table,
            has_tiles_table,
            metadata,
            tile_count: 0,
            zoom_levels: Vec::new(),
            samples: Vec::new(),
        };

        if !has_tiles_table {
            return Ok(summary);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tiles")
            .fetch_one(&self.pool)
            .await?;
        summary.tile_count = count.max(0) as u64;

        let zooms: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT zoom_level FROM tiles ORDER BY zoom_level")
                .fetch_all(&self.pool)
                .await?;
        summary.zoom_levels = zooms.into_iter().map(|z| z as u32).collect();

        let samples: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT zoom_level, tile_column, tile_row, LENGTH(tile_data) FROM tiles LIMIT ?",
        )
        .bind(SAMPLE_TILE_COUNT)
        .fetch_all(&self.pool)
        .await?;
        summary.samples = samples
            .into_iter()
            .map(|(z, x, y_tms, size)| TileSample {
                zoom_level: z as u32,
                tile_column: x as u32,
                tile_row: y_tms as u32,
                size: size.max(0) as u64,
            })
            .collect();

        Ok(summary)
    }

    /// Close every pooled handle.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TileStore for MbtilesArchive {
    async fn tile(&self, coord: TileCoord) -> Result<Option<Bytes>, ArchiveError> {
        self.get_tile(coord).await
    }

    async fn metadata(&self) -> Result<ArchiveMetadata, ArchiveError> {
        self.get_metadata().await
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Inspection
// =============================================================================

/// A stored tile as reported by [`MbtilesArchive::inspect`] (TMS row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSample {
    pub zoom_level: u32,
    pub tile_column: u32,
    pub tile_row: u32,
    pub size: u64,
}

/// Structural summary of an archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub has_metadata_table: bool,
    pub has_tiles_table: bool,
    pub metadata: ArchiveMetadata,
    pub tile_count: u64,
    pub zoom_levels: Vec<u32>,
    pub samples: Vec<TileSample>,
}

impl ArchiveSummary {
    /// Both relations exist and at least one tile is stored.
    pub fn is_valid(&self) -> bool {
        self.has_metadata_table && self.has_tiles_table && self.tile_count > 0
    }
}

// =============================================================================
// Tests
// =============================================================================
