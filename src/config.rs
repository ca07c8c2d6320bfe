//! Configuration management for the vector tile server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `VTS_` prefix
//! - Defaults for all optional settings
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `check` - Inspect an MBTiles archive and report whether it is servable
//!
//! # Environment Variables
//!
//! - `VTS_HOST` - Server bind address (default: 0.0.0.0)
//! - `VTS_PORT` - Server port (default: 8080)
//! - `VTS_MBTILES` - Path to the MBTiles archive (required)
//! - `VTS_FONTS_DIR` - Glyph directory (default: static/font)
//! - `VTS_STYLE_FILE` - Base style document (default: static/style-cdn.json)
//! - `VTS_PUBLIC_URL` - Externally visible root URL
//! - `VTS_VECTOR_LAYERS` - JSON file replacing the built-in vector layer schema
//! - `VTS_POOL_SIZE` - Read-only archive connections (default: 4)
//! - `VTS_READ_TIMEOUT_MS` - Bound on each archive read (default: 5000)
//! - `VTS_TILE_CACHE_MAX_AGE` - Tile Cache-Control max-age (default: 900)
//! - `VTS_ASSET_CACHE_MAX_AGE` - Glyph/style Cache-Control max-age (default: 86400)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::archive::{ArchiveOptions, DEFAULT_POOL_SIZE};
use crate::font::GLYPH_CACHE_MAX_AGE;
use crate::tile::TILE_CACHE_MAX_AGE;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default glyph directory.
pub const DEFAULT_FONTS_DIR: &str = "static/font";

/// Default base style document.
pub const DEFAULT_STYLE_FILE: &str = "static/style-cdn.json";

/// Default bound on a single archive read in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Vector Tile Server - serves an MBTiles archive to web map clients.
///
/// Delivers Mapbox Vector Tiles, TileJSON, font glyphs and a map style
/// rewritten to point at this server.
#[derive(Parser, Debug, Clone)]
#[command(name = "vector-tile-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the tile server.
    Serve(ServeConfig),

    /// Inspect an MBTiles archive and exit.
    Check(CheckConfig),
}

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "VTS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "VTS_PORT")]
    pub port: u16,

    /// Externally visible root URL (e.g. https://tiles.example.com).
    ///
    /// Used in TileJSON and style templates. If not specified, TileJSON
    /// follows the request's Host header and styles use http://localhost:{port}.
    #[arg(long, env = "VTS_PUBLIC_URL")]
    pub public_url: Option<String>,

    // =========================================================================
    // Data Configuration
    // =========================================================================
    /// Path to the MBTiles archive.
    #[arg(long, env = "VTS_MBTILES")]
    pub mbtiles: PathBuf,

    /// Directory containing `<font>/<range>.pbf` glyph files.
    #[arg(long, default_value = DEFAULT_FONTS_DIR, env = "VTS_FONTS_DIR")]
    pub fonts_dir: PathBuf,

    /// Base style document rewritten for local serving.
    #[arg(long, default_value = DEFAULT_STYLE_FILE, env = "VTS_STYLE_FILE")]
    pub style_file: PathBuf,

    /// JSON file replacing the built-in vector layer schema.
    #[arg(long, env = "VTS_VECTOR_LAYERS")]
    pub vector_layers: Option<PathBuf>,

    // =========================================================================
    // Archive Access
    // =========================================================================
    /// Number of read-only connections to the archive.
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "VTS_POOL_SIZE")]
    pub pool_size: u32,

    /// Upper bound on each archive, glyph and style read in milliseconds.
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS, env = "VTS_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // =========================================================================
    // HTTP Caching
    // =========================================================================
    /// Cache-Control max-age for tiles in seconds.
    #[arg(long, default_value_t = TILE_CACHE_MAX_AGE, env = "VTS_TILE_CACHE_MAX_AGE")]
    pub tile_cache_max_age: u32,

    /// Cache-Control max-age for glyphs and styles in seconds.
    #[arg(long, default_value_t = GLYPH_CACHE_MAX_AGE, env = "VTS_ASSET_CACHE_MAX_AGE")]
    pub asset_cache_max_age: u32,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.mbtiles.as_os_str().is_empty() {
            return Err(
                "MBTiles archive path is required. Set --mbtiles or VTS_MBTILES".to_string(),
            );
        }

        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".to_string());
        }

        if self.read_timeout_ms == 0 {
            return Err("read_timeout_ms must be greater than 0".to_string());
        }

        if let Some(ref public_url) = self.public_url {
            validate_public_url(public_url)?;
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The root URL used for style templates, without a trailing slash.
    pub fn public_url_or_default(&self) -> String {
        match self.public_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// The bound on each archive, glyph and style read.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Connection pool options for the archive.
    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions::default()
            .with_max_connections(self.pool_size)
            .with_acquire_timeout(self.read_timeout())
    }
}

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Path to the MBTiles archive.
    #[arg(long, env = "VTS_MBTILES")]
    pub mbtiles: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn validate_public_url(public_url: &str) -> Result<(), String> {
    let url = Url::parse(public_url)
        .map_err(|e| format!("public_url '{}' is not a valid URL: {}", public_url, e))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "public_url must use http or https, got '{}'",
            scheme
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
