//! Test utilities for integration tests.
//!
//! This module builds on-disk fixtures (MBTiles archives, font trees, base
//! styles) in a temporary directory and wires them into a router.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tempfile::TempDir;
use tower::ServiceExt;

use vector_tile_server::archive::{ArchiveMetadata, ArchiveOptions, MbtilesArchive, TileCoord, TileStore};
use vector_tile_server::error::ArchiveError;
use vector_tile_server::font::GlyphResolver;
use vector_tile_server::style::StyleRewriter;
use vector_tile_server::tile::TileService;
use vector_tile_server::{create_router, RouterConfig};

/// Public URL the fixture style rewriter is configured with.
pub const TEST_PUBLIC_URL: &str = "http://localhost:8080";

/// A payload that starts like a gzip stream, as stored tiles do.
pub fn fake_tile(tag: &str) -> Vec<u8> {
    let mut data = vec![0x1f, 0x8b, 0x08, 0x00];
    data.extend_from_slice(tag.as_bytes());
    data
}

// =============================================================================
// MBTiles Fixtures
// =============================================================================

/// A tile to store, addressed in web (XYZ) orientation.
pub struct XyzTile {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub data: Vec<u8>,
}

impl XyzTile {
    pub fn new(z: u8, x: u32, y: u32, data: Vec<u8>) -> Self {
        Self { z, x, y, data }
    }

    /// Row as stored in the archive (TMS orientation).
    fn tms_row(&self) -> u32 {
        (1u32 << self.z) - 1 - self.y
    }
}

/// Write an MBTiles file with the given metadata rows and tiles.
///
/// When `with_tiles_table` is false only the metadata relation is created,
/// which makes every tile lookup fail at the database level.
pub async fn write_mbtiles(
    path: &Path,
    metadata: &[(&str, &str)],
    tiles: &[XyzTile],
    with_tiles_table: bool,
) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

    sqlx::query("CREATE TABLE metadata (name TEXT, value TEXT)")
        .execute(&mut conn)
        .await
        .unwrap();
    for (name, value) in metadata {
        sqlx::query("INSERT INTO metadata (name, value) VALUES (?, ?)")
            .bind(*name)
            .bind(*value)
            .execute(&mut conn)
            .await
            .unwrap();
    }

    if with_tiles_table {
        sqlx::query(
            "CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, \
             tile_row INTEGER, tile_data BLOB)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query(
            "CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row)",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        for tile in tiles {
            sqlx::query(
                "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(tile.z as i64)
            .bind(tile.x as i64)
            .bind(tile.tms_row() as i64)
            .bind(tile.data.clone())
            .execute(&mut conn)
            .await
            .unwrap();
        }
    }

    conn.close().await.unwrap();
}

// =============================================================================
// Font and Style Fixtures
// =============================================================================

/// Write `<root>/<font>/<range>.pbf` files from `(font, range, contents)` triples.
pub fn write_fonts(root: &Path, glyphs: &[(&str, &str, &str)]) {
    for (font, range, data) in glyphs {
        let font_dir = root.join(font);
        std::fs::create_dir_all(&font_dir).unwrap();
        std::fs::write(font_dir.join(format!("{}.pbf", range)), data).unwrap();
    }
}

/// A base style shaped like the hosted OSM Bright document.
pub fn base_style() -> Value {
    json!({
        "version": 8,
        "name": "OSM Bright",
        "id": "osm-bright",
        "sprite": "https://cdn.example.com/sprites/osm-bright",
        "glyphs": "https://cdn.example.com/fonts/{fontstack}/{range}.pbf",
        "sources": {
            "openmaptiles": {
                "type": "vector",
                "url": "https://cdn.example.com/tiles.json"
            },
            "hillshade": {
                "type": "raster",
                "url": "https://cdn.example.com/hillshade.json"
            }
        },
        "layers": [
            {"id": "background", "type": "background"},
            {"id": "water", "type": "fill", "source": "openmaptiles", "source-layer": "water"}
        ]
    })
}

// =============================================================================
// Fixture
// =============================================================================

/// A temporary directory holding an archive, a font tree and a base style.
pub struct Fixture {
    pub dir: TempDir,
    pub mbtiles: PathBuf,
    pub fonts: PathBuf,
    pub style: PathBuf,
}

impl Fixture {
    /// Create an archive with the given metadata and tiles, plus empty font
    /// and style locations.
    pub async fn new(metadata: &[(&str, &str)], tiles: &[XyzTile]) -> Self {
        let fixture = Self::empty();
        write_mbtiles(&fixture.mbtiles, metadata, tiles, true).await;
        fixture
    }

    /// Paths only; nothing is written.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let mbtiles = dir.path().join("test.mbtiles");
        let fonts = dir.path().join("font");
        let style = dir.path().join("style-cdn.json");
        Self {
            dir,
            mbtiles,
            fonts,
            style,
        }
    }

    pub fn with_fonts(self, glyphs: &[(&str, &str, &str)]) -> Self {
        write_fonts(&self.fonts, glyphs);
        self
    }

    pub fn with_style(self, style: &Value) -> Self {
        std::fs::write(&self.style, serde_json::to_vec_pretty(style).unwrap()).unwrap();
        self
    }

    pub fn with_style_text(self, text: &str) -> Self {
        std::fs::write(&self.style, text).unwrap();
        self
    }

    /// Open the archive and build a router with tracing off.
    pub async fn router(&self) -> Router {
        self.router_with(RouterConfig::default().with_tracing(false))
            .await
    }

    pub async fn router_with(&self, config: RouterConfig) -> Router {
        let archive = MbtilesArchive::open(&self.mbtiles, ArchiveOptions::default())
            .await
            .unwrap();
        self.router_for(TileService::new(archive), config)
    }

    /// Build a router over an arbitrary tile service, sharing this fixture's
    /// fonts and style.
    pub fn router_for<S: TileStore + 'static>(
        &self,
        tile_service: TileService<S>,
        config: RouterConfig,
    ) -> Router {
        create_router(
            tile_service,
            GlyphResolver::new(&self.fonts),
            StyleRewriter::new(&self.style, TEST_PUBLIC_URL),
            config,
        )
    }
}

// =============================================================================
// Mock Store
// =============================================================================

/// A store whose every read fails, or never completes in time.
pub struct FaultyStore {
    delay: Option<std::time::Duration>,
}

impl FaultyStore {
    /// Every read fails with a database error.
    pub fn failing() -> Self {
        Self { delay: None }
    }

    /// Every read sleeps for `delay` before failing.
    pub fn hanging(delay: std::time::Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

#[async_trait]
impl TileStore for FaultyStore {
    async fn tile(&self, _coord: TileCoord) -> Result<Option<Bytes>, ArchiveError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(ArchiveError::Database("database disk image is malformed".to_string()))
    }

    async fn metadata(&self) -> Result<ArchiveMetadata, ArchiveError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(ArchiveError::Database("database disk image is malformed".to_string()))
    }

    fn identifier(&self) -> &str {
        "faulty://archive"
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Send a GET request through the router.
pub async fn get(router: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.oneshot(request).await.unwrap()
}

/// Send a GET request with extra headers.
pub async fn get_with_headers(router: Router, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
