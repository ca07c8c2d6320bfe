//! Map style rewriting.
//!
//! The base style is a third-party document pointing at hosted tile, glyph and
//! sprite services. Before it is served, the copy in memory is rewritten to
//! use this server's endpoints instead; the file on disk is never modified.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::StyleError;
use crate::tile::DEFAULT_READ_TIMEOUT;

/// The only style currently served.
pub const LOCAL_STYLE_ID: &str = "osm-bright-local";

/// Display name written into the rewritten style.
pub const LOCAL_STYLE_NAME: &str = "OSM Bright Local";

/// Name of the vector source replaced with the local tile endpoint.
pub const VECTOR_SOURCE_NAME: &str = "openmaptiles";

/// Zoom range advertised for the local vector source.
pub const LOCAL_SOURCE_ZOOM: (u8, u8) = (0, 14);

/// Entry in the style catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleEntry {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// The style catalog served by `/styles/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleCatalog {
    pub styles: Vec<StyleEntry>,
    pub count: usize,
}

/// Loads the base style and rewrites it to local endpoints.
///
/// # Example
///
/// ```ignore
/// use vector_tile_server::style::StyleRewriter;
///
/// let rewriter = StyleRewriter::new("static/style-cdn.json", "http://localhost:8080");
/// let style = rewriter.serve_style("osm-bright-local").await?;
/// assert!(style.get("sprite").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct StyleRewriter {
    base_style: PathBuf,
    tiles_url: String,
    glyphs_url: String,
    read_timeout: Duration,
}

impl StyleRewriter {
    /// Create a rewriter for the base style at `base_style`.
    ///
    /// `public_url` is the externally visible root of this server, e.g.
    /// `http://localhost:8080`. Tile and glyph templates are derived from it.
    pub fn new(base_style: impl Into<PathBuf>, public_url: &str) -> Self {
        let root = public_url.trim_end_matches('/');
        Self {
            base_style: base_style.into(),
            tiles_url: format!("{}/tiles/{{z}}/{{x}}/{{y}}.mvt", root),
            glyphs_url: format!("{}/fonts/{{fontstack}}/{{range}}.pbf", root),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set the bound on reading the base style document.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// The bound on reading the base style document.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Path of the base style document.
    pub fn base_style(&self) -> &Path {
        &self.base_style
    }

    /// Tile URL template written into the vector source.
    pub fn tiles_url(&self) -> &str {
        &self.tiles_url
    }

    /// Glyph URL template written into the style.
    pub fn glyphs_url(&self) -> &str {
        &self.glyphs_url
    }

    /// Serve a style by name.
    ///
    /// # Errors
    ///
    /// - [`StyleError::UnknownStyle`] for any name other than [`LOCAL_STYLE_ID`]
    /// - [`StyleError::NotFound`] if the base style cannot be read
    /// - [`StyleError::Timeout`] if reading it exceeds the read timeout
    /// - [`StyleError::Invalid`] if it is not a JSON object
    pub async fn serve_style(&self, style_name: &str) -> Result<Value, StyleError> {
        if style_name != LOCAL_STYLE_ID {
            warn!(style = style_name, "Unknown style requested");
            return Err(StyleError::UnknownStyle(style_name.to_string()));
        }

        let mut style = self.load_base_style().await?;

        let original_name = style
            .get("name")
            .and_then(|name| name.as_str())
            .unwrap_or("Unknown")
            .to_string();
        let layer_count = style
            .get("layers")
            .and_then(|layers| layers.as_array())
            .map_or(0, Vec::len);
        info!(
            style = style_name,
            "Original style loaded: {} with {} layers", original_name, layer_count
        );

        self.rewrite(&mut style)?;

        info!(style = style_name, "Served style: {}.json", style_name);
        Ok(style)
    }

    /// Apply the local-endpoint rewrite rules in place.
    ///
    /// - The `openmaptiles` source, if present, is replaced by a vector source
    ///   pointing at the local tile template with zoom 0-14
    /// - `glyphs` is set to the local glyph template
    /// - `sprite` is removed
    /// - `name` and `id` are set to the local variant
    pub fn rewrite(&self, style: &mut Value) -> Result<(), StyleError> {
        let doc = style
            .as_object_mut()
            .ok_or_else(|| StyleError::Invalid("style root is not a JSON object".to_string()))?;

        if let Some(sources) = doc.get_mut("sources").and_then(Value::as_object_mut) {
            if sources.contains_key(VECTOR_SOURCE_NAME) {
                sources.insert(VECTOR_SOURCE_NAME.to_string(), self.local_source());
            }
        }

        doc.insert("glyphs".to_string(), Value::String(self.glyphs_url.clone()));
        doc.remove("sprite");
        doc.insert("name".to_string(), Value::String(LOCAL_STYLE_NAME.to_string()));
        doc.insert("id".to_string(), Value::String(LOCAL_STYLE_ID.to_string()));

        Ok(())
    }

    /// The single-entry catalog of served styles.
    pub fn list_styles(&self) -> StyleCatalog {
        let styles = vec![StyleEntry {
            name: LOCAL_STYLE_ID.to_string(),
            description: "OSM Bright style with local tile and font endpoints".to_string(),
            url: format!("/styles/{}.json", LOCAL_STYLE_ID),
        }];
        StyleCatalog {
            count: styles.len(),
            styles,
        }
    }

    fn local_source(&self) -> Value {
        let (minzoom, maxzoom) = LOCAL_SOURCE_ZOOM;
        json!({
            "type": "vector",
            "tiles": [self.tiles_url],
            "minzoom": minzoom,
            "maxzoom": maxzoom,
        })
    }

    async fn load_base_style(&self) -> Result<Value, StyleError> {
        let read = tokio::fs::read_to_string(&self.base_style);
        let text = match tokio::time::timeout(self.read_timeout, read).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                error!(path = %self.base_style.display(), "Style file not found");
                return Err(StyleError::NotFound(self.base_style.clone()));
            }
            Ok(Err(e)) => {
                error!(path = %self.base_style.display(), "Error reading style file: {}", e);
                return Err(StyleError::NotFound(self.base_style.clone()));
            }
            Err(_) => {
                let millis = self.read_timeout.as_millis() as u64;
                error!(path = %self.base_style.display(), timeout_ms = millis, "Timed out reading style file");
                return Err(StyleError::Timeout { millis });
            }
        };

        let style: Value = serde_json::from_str(&text).map_err(|e| {
            error!(path = %self.base_style.display(), "Invalid JSON in style file: {}", e);
            StyleError::Invalid(e.to_string())
        })?;

        if !style.is_object() {
            return Err(StyleError::Invalid(
                "style root is not a JSON object".to_string(),
            ));
        }

        Ok(style)
    }
}
