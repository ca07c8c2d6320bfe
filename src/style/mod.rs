//! Map style serving.
//!
//! A single allow-listed style (`osm-bright-local`) is served. It is loaded
//! from a base document on disk and rewritten so that its vector source and
//! glyphs point at this server; the sprite is dropped as no sprite service
//! exists locally.

mod rewriter;

pub use rewriter::{
    StyleCatalog, StyleEntry, StyleRewriter, LOCAL_SOURCE_ZOOM, LOCAL_STYLE_ID, LOCAL_STYLE_NAME,
    VECTOR_SOURCE_NAME,
};
