use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the tile archive (MBTiles) layer
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// The archive file does not exist at the configured path
    #[error("Archive not found: {}", .0.display())]
    NotFound(PathBuf),

    /// SQLite failed while opening or querying the archive
    #[error("Database error: {0}")]
    Database(String),

    /// A read did not complete within the configured timeout
    #[error("Archive read timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl From<sqlx::Error> for ArchiveError {
    fn from(err: sqlx::Error) -> Self {
        ArchiveError::Database(err.to_string())
    }
}

/// Errors that can occur while serving a single tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// A coordinate was not an integer or lies outside the zoom's grid
    #[error("Invalid tile coordinates: {message}")]
    InvalidCoordinate { message: String },

    /// Zoom level outside 0..=18
    #[error("Invalid zoom level: {zoom} (valid range: 0-{max_zoom})")]
    InvalidZoom { zoom: i64, max_zoom: u8 },

    /// The archive holds no tile at the requested address
    #[error("Tile not found: {z}/{x}/{y}")]
    NotFound { z: u8, x: u32, y: u32 },

    /// The archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Errors from the font glyph resolver
#[derive(Debug, Clone, Error)]
pub enum GlyphError {
    /// None of the fonts in the stack has the requested range
    #[error("No glyphs for range {range} in font stack '{fontstack}'")]
    GlyphNotFound { fontstack: String, range: String },

    /// The font directory could not be enumerated
    #[error("Font directory error: {0}")]
    Io(String),
}

/// Errors from the style rewriter
#[derive(Debug, Clone, Error)]
pub enum StyleError {
    /// Style name is not in the catalog
    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    /// The base style document could not be read
    #[error("Style file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The base style document is not a valid style JSON object
    #[error("Invalid style document: {0}")]
    Invalid(String),

    /// Reading the base style document exceeded the read timeout
    #[error("Style file read timed out after {millis}ms")]
    Timeout { millis: u64 },
}
