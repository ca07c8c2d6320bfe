//! The tile store capability.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ArchiveError;

use super::coord::TileCoord;
use super::metadata::ArchiveMetadata;

/// Read access to a pre-built, immutable tile archive.
///
/// This abstraction lets the tile service work with different storage
/// strategies (pooled SQLite handles, per-request connections, in-memory
/// fixtures) without being tied to a specific implementation.
///
/// Implementations must tolerate concurrent calls from many requests.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Fetch the stored payload for a tile.
    ///
    /// The bytes are returned exactly as stored (for MVT archives, already
    /// gzip-compressed). `Ok(None)` means the archive has no such tile;
    /// `Err` means the archive could not be read.
    async fn tile(&self, coord: TileCoord) -> Result<Option<Bytes>, ArchiveError>;

    /// Read all rows of the archive's metadata table.
    async fn metadata(&self) -> Result<ArchiveMetadata, ArchiveError>;

    /// Human-readable identifier for logs (e.g. the archive path).
    fn identifier(&self) -> &str;
}
