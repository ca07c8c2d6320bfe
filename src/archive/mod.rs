//! Tile archive layer.
//!
//! This module reads pre-built MBTiles archives: translating between web (XYZ)
//! and archive (TMS) tile addressing, fetching raw tile payloads and parsing
//! the archive's key/value metadata.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            TileStore Trait              │
//! │   (tile lookup + metadata, read-only)   │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            MbtilesArchive               │
//! │   (SQLite, pool of read-only handles)   │
//! └─────────────────────────────────────────┘
//! ```

mod coord;
mod mbtiles;
mod metadata;
mod store;

pub use coord::{max_index, tms_to_xyz, xyz_to_tms, TileCoord, MAX_ZOOM};
pub use mbtiles::{
    ArchiveOptions, ArchiveSummary, MbtilesArchive, TileSample, DEFAULT_ACQUIRE_TIMEOUT,
    DEFAULT_POOL_SIZE,
};
pub use metadata::{ArchiveMetadata, DEFAULT_ZOOM_RANGE};
pub use store::TileStore;
