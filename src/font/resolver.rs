//! Font glyph range resolution.
//!
//! Map renderers request glyphs as `/fonts/{fontstack}/{range}.pbf`, where the
//! font stack is a comma-separated list of font names in order of preference
//! and the range is a block of 256 Unicode code points (`0-255`, `256-511`, ...).
//! Glyph blobs are stored on disk as `<root>/<font name>/<range>.pbf`.

use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::GlyphError;
use crate::tile::DEFAULT_READ_TIMEOUT;

/// Cache-Control max-age for glyphs and styles in seconds (24 hours).
pub const GLYPH_CACHE_MAX_AGE: u32 = 86400;

/// Content type of glyph range blobs.
pub const GLYPH_CONTENT_TYPE: &str = "application/x-protobuf";

const GLYPH_EXTENSION: &str = "pbf";

/// A font and the glyph ranges stored for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontEntry {
    pub name: String,
    pub ranges: Vec<String>,
}

impl fmt::Display for FontEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ranges.join(", "))
    }
}

/// Resolves font stacks to glyph range blobs stored under a directory.
#[derive(Debug, Clone)]
pub struct GlyphResolver {
    root: PathBuf,
    read_timeout: Duration,
}

impl GlyphResolver {
    /// Create a resolver over the given font directory.
    ///
    /// The directory is not required to exist; a missing directory simply
    /// resolves nothing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set the bound on each glyph file read and on each directory scan.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// The font directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The bound on each filesystem read.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Resolve a glyph range for a font stack.
    ///
    /// Candidates are tried in stack order and the first stored blob wins.
    /// A candidate whose read fails or exceeds the read timeout is logged
    /// and skipped.
    ///
    /// # Errors
    ///
    /// [`GlyphError::GlyphNotFound`] if no candidate has the range.
    pub async fn resolve_glyph_range(&self, fontstack: &str, range: &str) -> Result<Bytes, GlyphError> {
        let not_found = || GlyphError::GlyphNotFound {
            fontstack: fontstack.to_string(),
            range: range.to_string(),
        };

        if !is_valid_range(range) {
            debug!(fontstack, range, "Rejected malformed glyph range");
            return Err(not_found());
        }

        for font in parse_font_stack(fontstack) {
            if !is_safe_font_name(font) {
                debug!(font, "Skipping unsafe font name");
                continue;
            }

            let path = self.glyph_path(font, range);
            debug!(path = %path.display(), "Trying font file");

            match tokio::time::timeout(self.read_timeout, tokio::fs::read(&path)).await {
                Ok(Ok(data)) => {
                    info!(font, range, "Served font: {}/{}.pbf", font, range);
                    return Ok(Bytes::from(data));
                }
                Ok(Err(e)) if e.kind() == ErrorKind::NotFound => continue,
                Ok(Err(e)) => {
                    warn!(font, range, "Error reading glyph file {}: {}", path.display(), e);
                    continue;
                }
                Err(_) => {
                    warn!(
                        font,
                        range,
                        timeout_ms = self.read_timeout.as_millis() as u64,
                        "Timed out reading glyph file {}",
                        path.display()
                    );
                    continue;
                }
            }
        }

        // Diagnostics only; enumeration failure must not change the outcome.
        let available = self.font_names().await.unwrap_or_default();
        warn!(
            fontstack,
            range,
            available = ?available,
            "No fonts found in stack"
        );

        Err(not_found())
    }

    /// Enumerate every font and its stored ranges.
    ///
    /// Fonts are sorted by name; ranges by their starting code point.
    pub async fn list_fonts(&self) -> Result<Vec<FontEntry>, GlyphError> {
        self.bounded(self.scan_fonts()).await
    }

    /// Names of the font directories, sorted.
    ///
    /// A missing font root yields an empty list.
    pub async fn font_names(&self) -> Result<Vec<String>, GlyphError> {
        self.bounded(self.scan_font_names()).await
    }

    async fn scan_fonts(&self) -> Result<Vec<FontEntry>, GlyphError> {
        let mut fonts = Vec::new();

        for name in self.scan_font_names().await? {
            let mut ranges = Vec::new();
            let mut dir = tokio::fs::read_dir(self.root.join(&name))
                .await
                .map_err(|e| GlyphError::Io(e.to_string()))?;

            while let Some(entry) = dir
                .next_entry()
                .await
                .map_err(|e| GlyphError::Io(e.to_string()))?
            {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(GLYPH_EXTENSION) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ranges.push(stem.to_string());
                }
            }

            sort_ranges(&mut ranges);
            fonts.push(FontEntry { name, ranges });
        }

        Ok(fonts)
    }

    async fn scan_font_names(&self) -> Result<Vec<String>, GlyphError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GlyphError::Io(e.to_string())),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| GlyphError::Io(e.to_string()))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, GlyphError>>,
    ) -> Result<T, GlyphError> {
        match tokio::time::timeout(self.read_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let millis = self.read_timeout.as_millis() as u64;
                warn!(root = %self.root.display(), timeout_ms = millis, "Font directory scan timed out");
                Err(GlyphError::Io(format!(
                    "font directory scan timed out after {}ms",
                    millis
                )))
            }
        }
    }

    fn glyph_path(&self, font: &str, range: &str) -> PathBuf {
        self.root
            .join(font)
            .join(format!("{}.{}", range, GLYPH_EXTENSION))
    }
}

/// Split a font stack into trimmed, non-empty names, preserving order.
pub fn parse_font_stack(fontstack: &str) -> Vec<&str> {
    fontstack
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Font names become directory names; reject anything that could escape the root.
fn is_safe_font_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A range is `<start>-<end>` in decimal code points.
fn is_valid_range(range: &str) -> bool {
    match range.split_once('-') {
        Some((start, end)) => {
            !start.is_empty()
                && !end.is_empty()
                && start.bytes().all(|b| b.is_ascii_digit())
                && end.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Sort by starting code point; non-numeric names go last, alphabetically.
fn sort_ranges(ranges: &mut [String]) {
    ranges.sort_by(|a, b| {
        let key = |r: &str| {
            r.split_once('-')
                .and_then(|(start, _)| start.parse::<u32>().ok())
        };
        match (key(a), key(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}
