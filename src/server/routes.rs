//! Router configuration for the vector tile server.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                              - Health check
//! /tiles/{z}/{x}/{y}.mvt               - Vector tile
//! /tiles/stats/                        - Archive metadata and zoom range
//! /tiles/metadata.json                 - TileJSON
//! /fonts/                              - Font catalog (plain text)
//! /fonts/{fontstack}/{range}.pbf       - Glyph range
//! /styles/                             - Style catalog
//! /styles/{name}.json                  - Rewritten style
//! ```
//!
//! Catalog routes answer with and without the trailing slash. CORS preflight
//! requests are answered by the CORS layer on every route.
//!
//! # Example
//!
//! ```ignore
//! use vector_tile_server::archive::{ArchiveOptions, MbtilesArchive};
//! use vector_tile_server::font::GlyphResolver;
//! use vector_tile_server::server::{create_router, RouterConfig};
//! use vector_tile_server::style::StyleRewriter;
//! use vector_tile_server::tile::TileService;
//!
//! let archive = MbtilesArchive::open("berlin.mbtiles", ArchiveOptions::default()).await?;
//! let tile_service = TileService::new(archive);
//! let glyphs = GlyphResolver::new("static/font");
//! let styles = StyleRewriter::new("static/style-cdn.json", "http://localhost:8080");
//!
//! let router = create_router(tile_service, glyphs, styles, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    font_handler, fonts_list_handler, health_handler, style_handler, styles_list_handler,
    tile_handler, tile_stats_handler, tilejson_handler, AppState,
};
use crate::archive::TileStore;
use crate::font::{GlyphResolver, GLYPH_CACHE_MAX_AGE};
use crate::style::StyleRewriter;
use crate::tile::{TileService, TILE_CACHE_MAX_AGE};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Externally visible root URL used in TileJSON; `None` derives it from
    /// the request's `Host` header
    pub public_url: Option<String>,

    /// Cache-Control max-age for tiles in seconds
    pub tile_cache_max_age: u32,

    /// Cache-Control max-age for glyphs and styles in seconds
    pub asset_cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    /// By default:
    /// - TileJSON URLs follow the request's `Host` header
    /// - Tiles are cacheable for 15 minutes, glyphs and styles for 24 hours
    /// - Tracing is enabled
    fn default() -> Self {
        Self {
            public_url: None,
            tile_cache_max_age: TILE_CACHE_MAX_AGE,
            asset_cache_max_age: GLYPH_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Set the externally visible root URL.
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = Some(public_url.into());
        self
    }

    /// Set the tile Cache-Control max-age in seconds.
    pub fn with_tile_cache_max_age(mut self, seconds: u32) -> Self {
        self.tile_cache_max_age = seconds;
        self
    }

    /// Set the glyph and style Cache-Control max-age in seconds.
    pub fn with_asset_cache_max_age(mut self, seconds: u32) -> Self {
        self.asset_cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `tile_service` - Tile, stats and TileJSON source
/// * `glyphs` - Font glyph resolver
/// * `styles` - Style rewriter
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<S>(
    tile_service: TileService<S>,
    glyphs: GlyphResolver,
    styles: StyleRewriter,
    config: RouterConfig,
) -> Router
where
    S: TileStore + 'static,
{
    let app_state = AppState::new(tile_service, glyphs, styles)
        .with_public_url(config.public_url.clone())
        .with_cache_max_age(config.tile_cache_max_age, config.asset_cache_max_age);

    let cors = build_cors_layer();
    let router = build_router(app_state, cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn build_router<S>(app_state: AppState<S>, cors: CorsLayer) -> Router
where
    S: TileStore + 'static,
{
    // {filename} captures both "{y}" and "{y}.mvt"
    Router::new()
        .route("/health", get(health_handler))
        .route("/tiles/{z}/{x}/{filename}", get(tile_handler::<S>))
        .route("/tiles/stats", get(tile_stats_handler::<S>))
        .route("/tiles/stats/", get(tile_stats_handler::<S>))
        .route("/tiles/metadata.json", get(tilejson_handler::<S>))
        .route("/fonts", get(fonts_list_handler::<S>))
        .route("/fonts/", get(fonts_list_handler::<S>))
        .route("/fonts/{fontstack}/{filename}", get(font_handler::<S>))
        .route("/styles", get(styles_list_handler::<S>))
        .route("/styles/", get(styles_list_handler::<S>))
        .route("/styles/{filename}", get(style_handler::<S>))
        .with_state(app_state)
        .layer(cors)
}

/// Build the CORS layer.
///
/// Map clients load tiles, glyphs and styles cross-origin, so any origin is
/// allowed.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)) // 24 hours
}

// =============================================================================
// Tests
// =============================================================================
