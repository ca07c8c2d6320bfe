//! HTTP request handlers for the vector tile API.
//!
//! This module contains the Axum handlers for tiles, TileJSON, fonts, styles
//! and health checks.
//!
//! # Endpoints
//!
//! - `GET /tiles/{z}/{x}/{y}.mvt` - Serve a vector tile
//! - `GET /tiles/stats/` - Archive metadata, bounds and zoom range
//! - `GET /tiles/metadata.json` - TileJSON document
//! - `GET /fonts/` - Plain-text font catalog
//! - `GET /fonts/{fontstack}/{range}.pbf` - Glyph range
//! - `GET /styles/` - Style catalog
//! - `GET /styles/{name}.json` - Rewritten map style
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::archive::TileStore;
use crate::error::{GlyphError, StyleError, TileError};
use crate::font::{GlyphResolver, GLYPH_CACHE_MAX_AGE, GLYPH_CONTENT_TYPE};
use crate::style::{StyleCatalog, StyleRewriter};
use crate::tile::{
    TileJson, TileService, TileStats, TILE_CACHE_MAX_AGE, TILE_CONTENT_ENCODING,
    TILE_CONTENT_TYPE,
};

/// Host assumed for TileJSON URLs when the request carries no `Host` header.
const DEFAULT_HOST: &str = "localhost:8080";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the services.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: TileStore> {
    /// Tile and metadata service
    pub tile_service: Arc<TileService<S>>,

    /// Font glyph resolver
    pub glyphs: Arc<GlyphResolver>,

    /// Style rewriter
    pub styles: Arc<StyleRewriter>,

    /// Externally visible root URL; when unset TileJSON URLs are derived
    /// from the request's `Host` header
    pub public_url: Option<String>,

    /// Cache-Control max-age for tiles in seconds
    pub tile_cache_max_age: u32,

    /// Cache-Control max-age for glyphs and styles in seconds
    pub asset_cache_max_age: u32,
}

impl<S: TileStore> AppState<S> {
    /// Create a new application state with default cache lifetimes.
    pub fn new(tile_service: TileService<S>, glyphs: GlyphResolver, styles: StyleRewriter) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            glyphs: Arc::new(glyphs),
            styles: Arc::new(styles),
            public_url: None,
            tile_cache_max_age: TILE_CACHE_MAX_AGE,
            asset_cache_max_age: GLYPH_CACHE_MAX_AGE,
        }
    }

    /// Set the externally visible root URL.
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    /// Set the tile and asset Cache-Control lifetimes.
    pub fn with_cache_max_age(mut self, tiles: u32, assets: u32) -> Self {
        self.tile_cache_max_age = tiles;
        self.asset_cache_max_age = assets;
        self
    }

    /// Base URL of the tile endpoint (ending in `/tiles/`).
    pub fn tiles_base_url(&self, headers: &HeaderMap) -> String {
        if let Some(ref public_url) = self.public_url {
            return format!("{}/tiles/", public_url.trim_end_matches('/'));
        }

        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or(DEFAULT_HOST);

        // Respect X-Forwarded-Proto from a reverse proxy
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("http");

        format!("{}://{}/tiles/", proto, host)
    }
}

impl<S: TileStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            glyphs: Arc::clone(&self.glyphs),
            styles: Arc::clone(&self.styles),
            public_url: self.public_url.clone(),
            tile_cache_max_age: self.tile_cache_max_age,
            asset_cache_max_age: self.asset_cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{z}/{x}/{filename}`
/// where filename is `{y}.mvt` or `{y}`. Kept as strings so non-integer
/// input is reported as an invalid coordinate rather than a routing error.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub z: String,
    pub x: String,
    pub filename: String,
}

/// Path parameters for glyph requests.
///
/// Extracted from: `/fonts/{fontstack}/{filename}` where filename is `{range}.pbf`.
#[derive(Debug, Deserialize)]
pub struct FontPathParams {
    /// Comma-separated font names, most preferred first
    pub fontstack: String,

    /// Range with optional `.pbf` extension (e.g. "0-255.pbf")
    pub filename: String,
}

impl FontPathParams {
    /// The range identifier, or `None` if the filename lacks `.pbf`.
    pub fn range(&self) -> Option<&str> {
        self.filename.strip_suffix(".pbf")
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_zoom")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Response Headers
// =============================================================================

/// Add the permissive CORS headers set on every tile, font and style response.
pub fn insert_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

/// Add `Cache-Control: public, max-age={max_age}`.
pub fn insert_cache_control(headers: &mut HeaderMap, max_age: u32) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
}

fn asset_headers(content_type: &'static str, max_age: u32) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    insert_cors_headers(&mut headers);
    insert_cache_control(&mut headers, max_age);
    headers
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error response based on its severity:
/// - 5xx at ERROR
/// - 404 at DEBUG (common and expected)
/// - other 4xx at WARN
fn log_error(status: StatusCode, error_type: &str, detail: &str) {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            detail
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            detail
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            detail
        );
    }
}

fn json_error(status: StatusCode, error_type: &str, message: impl Into<String>) -> Response {
    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

/// Convert TileError to HTTP response.
///
/// Archive faults are reported with a generic message; the detail is logged.
/// A missing tile is a 404 with an empty body.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let detail = self.to_string();

        match self {
            TileError::InvalidCoordinate { message } => {
                log_error(StatusCode::BAD_REQUEST, "invalid_coordinates", &detail);
                json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_coordinates",
                    format!("Invalid tile coordinates: {}", message),
                )
            }
            TileError::InvalidZoom { .. } => {
                log_error(StatusCode::BAD_REQUEST, "invalid_zoom", &detail);
                json_error(StatusCode::BAD_REQUEST, "invalid_zoom", detail)
            }
            TileError::NotFound { .. } => {
                log_error(StatusCode::NOT_FOUND, "not_found", &detail);
                StatusCode::NOT_FOUND.into_response()
            }
            TileError::Archive(_) => {
                log_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", &detail);
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        }
    }
}

/// Convert GlyphError to HTTP response.
impl IntoResponse for GlyphError {
    fn into_response(self) -> Response {
        let detail = self.to_string();

        let (status, error_type, message) = match self {
            GlyphError::GlyphNotFound { .. } => {
                (StatusCode::NOT_FOUND, "not_found", "Font file not found")
            }
            GlyphError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Error listing fonts",
            ),
        };

        log_error(status, error_type, &detail);
        json_error(status, error_type, message)
    }
}

/// Convert StyleError to HTTP response.
///
/// Every style failure, including a malformed base document, is a 404.
impl IntoResponse for StyleError {
    fn into_response(self) -> Response {
        let detail = self.to_string();

        let message = match self {
            StyleError::UnknownStyle(_) => "Style not found",
            StyleError::NotFound(_) | StyleError::Timeout { .. } => "Style file not found",
            StyleError::Invalid(_) => "Invalid style file",
        };

        log_error(StatusCode::NOT_FOUND, "not_found", &detail);
        json_error(StatusCode::NOT_FOUND, "not_found", message)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{z}/{x}/{y}.mvt`
///
/// # Response
///
/// - `200 OK`: gzip-compressed Mapbox Vector Tile
/// - `400 Bad Request`: non-integer or out-of-range coordinates
/// - `404 Not Found`: tile not in archive (empty body)
/// - `500 Internal Server Error`: archive read failure
///
/// # Headers
///
/// - `Content-Type: application/x-protobuf`
/// - `Content-Encoding: gzip`
/// - `Cache-Control: public, max-age={tile_cache_max_age}`
/// - `Access-Control-Allow-*`
pub async fn tile_handler<S: TileStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, TileError> {
    let data = state
        .tile_service
        .serve_tile(&params.z, &params.x, &params.filename)
        .await?;

    let mut headers = asset_headers(TILE_CONTENT_TYPE, state.tile_cache_max_age);
    headers.insert(
        header::CONTENT_ENCODING,
        HeaderValue::from_static(TILE_CONTENT_ENCODING),
    );

    Ok((StatusCode::OK, headers, Body::from(data)).into_response())
}

/// Handle archive statistics requests.
///
/// # Endpoint
///
/// `GET /tiles/stats/`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "metadata": {"name": "Berlin", "format": "pbf"},
///   "bounds": [13.0882, 52.3382, 13.7606, 52.6755],
///   "minzoom": 0,
///   "maxzoom": 14
/// }
/// ```
pub async fn tile_stats_handler<S: TileStore>(State(state): State<AppState<S>>) -> Json<TileStats> {
    Json(state.tile_service.tile_stats().await)
}

/// Handle TileJSON requests.
///
/// # Endpoint
///
/// `GET /tiles/metadata.json`
///
/// The `tiles` URL is built from the configured public URL, or from the
/// request's `Host` and `X-Forwarded-Proto` headers.
pub async fn tilejson_handler<S: TileStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Json<TileJson> {
    let base_url = state.tiles_base_url(&headers);
    Json(state.tile_service.tilejson(&base_url).await)
}

/// Handle glyph range requests.
///
/// # Endpoint
///
/// `GET /fonts/{fontstack}/{range}.pbf`
///
/// # Response
///
/// - `200 OK`: glyph range protobuf from the first font in the stack that has it
/// - `404 Not Found`: no font in the stack has the range, or the path has no
///   `.pbf` extension
pub async fn font_handler<S: TileStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<FontPathParams>,
) -> Result<Response, GlyphError> {
    let range = params.range().ok_or_else(|| GlyphError::GlyphNotFound {
        fontstack: params.fontstack.clone(),
        range: params.filename.clone(),
    })?;
    let data = state
        .glyphs
        .resolve_glyph_range(&params.fontstack, range)
        .await?;

    let headers = asset_headers(GLYPH_CONTENT_TYPE, state.asset_cache_max_age);
    Ok((StatusCode::OK, headers, Body::from(data)).into_response())
}

/// Handle font catalog requests.
///
/// # Endpoint
///
/// `GET /fonts/`
///
/// # Response
///
/// `200 OK` with a plain-text listing:
/// ```text
/// Available fonts:
/// Noto Sans Regular: 0-255, 256-511
/// Open Sans Bold: 0-255
/// ```
pub async fn fonts_list_handler<S: TileStore>(
    State(state): State<AppState<S>>,
) -> Result<Response, GlyphError> {
    let fonts = state.glyphs.list_fonts().await?;

    let mut body = String::from("Available fonts:\n");
    for font in &fonts {
        body.push_str(&font.to_string());
        body.push('\n');
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Handle style requests.
///
/// # Endpoint
///
/// `GET /styles/{name}.json`
///
/// # Response
///
/// - `200 OK`: the base style rewritten to local tile and glyph endpoints
/// - `404 Not Found`: unknown style name, no `.json` extension, or base style
///   missing/malformed
pub async fn style_handler<S: TileStore>(
    State(state): State<AppState<S>>,
    Path(filename): Path<String>,
) -> Result<Response, StyleError> {
    let name = filename
        .strip_suffix(".json")
        .ok_or_else(|| StyleError::UnknownStyle(filename.clone()))?;
    let style = state.styles.serve_style(name).await?;

    let mut headers = HeaderMap::new();
    insert_cors_headers(&mut headers);
    insert_cache_control(&mut headers, state.asset_cache_max_age);

    Ok((StatusCode::OK, headers, Json(style)).into_response())
}

/// Handle style catalog requests.
///
/// # Endpoint
///
/// `GET /styles/`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "styles": [{"name": "osm-bright-local", "description": "...", "url": "/styles/osm-bright-local.json"}],
///   "count": 1
/// }
/// ```
pub async fn styles_list_handler<S: TileStore>(
    State(state): State<AppState<S>>,
) -> Json<StyleCatalog> {
    Json(state.styles.list_styles())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
