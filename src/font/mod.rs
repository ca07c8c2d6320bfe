//! Font glyph serving.
//!
//! Resolves comma-separated font stacks to pre-rendered glyph range blobs
//! (the `.pbf` files MapLibre/Mapbox GL request for text rendering).

mod resolver;

pub use resolver::{
    parse_font_stack, FontEntry, GlyphResolver, GLYPH_CACHE_MAX_AGE, GLYPH_CONTENT_TYPE,
};
