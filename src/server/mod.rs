//! HTTP server layer for the vector tile server.
//!
//! This module provides the HTTP API for tiles, TileJSON, glyphs and styles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │       /tiles/...        /fonts/...        /styles/...           │
//! │                                                                 │
//! │  ┌───────────────────────────┐  ┌───────────────────────────┐   │
//! │  │         handlers          │  │          routes           │   │
//! │  │ (requests, error mapping) │  │ (router config, tracing)  │   │
//! │  └───────────────────────────┘  └───────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    font_handler, fonts_list_handler, health_handler, style_handler, styles_list_handler,
    tile_handler, tile_stats_handler, tilejson_handler, AppState, ErrorResponse,
    FontPathParams, HealthResponse, TilePathParams,
};
pub use routes::{create_router, RouterConfig};
