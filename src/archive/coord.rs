//! Tile addressing.
//!
//! Web maps address tiles in XYZ space where row 0 is the northernmost row.
//! MBTiles stores rows in TMS orientation where row 0 is the southernmost.
//! Both schemes share zoom and column; only the row is flipped:
//!
//! ```text
//! y_tms = 2^z - 1 - y_xyz
//! ```

use std::fmt;

use crate::error::TileError;

/// Highest zoom level the service accepts.
pub const MAX_ZOOM: u8 = 18;

/// Largest valid column/row index at zoom `z` (`2^z - 1`).
///
/// # Panics
///
/// Requires `z <= MAX_ZOOM`. Debug builds assert it; release builds give
/// meaningless results past that and overflow from `z = 32`.
#[inline]
pub fn max_index(z: u8) -> u32 {
    debug_assert!(z <= MAX_ZOOM, "zoom {} exceeds {}", z, MAX_ZOOM);
    (1u32 << z) - 1
}

/// Convert an XYZ row to the TMS row stored in the archive.
///
/// Requires `z <= MAX_ZOOM` and `y <= max_index(z)`, which [`TileCoord`]
/// guarantees.
#[inline]
pub fn xyz_to_tms(z: u8, y: u32) -> u32 {
    let max = max_index(z);
    debug_assert!(y <= max, "row {} outside zoom {}", y, z);
    max - y
}

/// Convert a TMS row from the archive back to XYZ.
///
/// Same preconditions as [`xyz_to_tms`].
#[inline]
pub fn tms_to_xyz(z: u8, y_tms: u32) -> u32 {
    // The flip is its own inverse.
    xyz_to_tms(z, y_tms)
}

/// A validated tile address in XYZ space.
///
/// Construction guarantees `z <= MAX_ZOOM` and `x, y <= 2^z - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    z: u8,
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Validate integer coordinates.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidZoom`] if `z` is outside `0..=MAX_ZOOM`
    /// - [`TileError::InvalidCoordinate`] if `x` or `y` is outside `0..=2^z-1`
    pub fn new(z: i64, x: i64, y: i64) -> Result<Self, TileError> {
        if !(0..=i64::from(MAX_ZOOM)).contains(&z) {
            return Err(TileError::InvalidZoom {
                zoom: z,
                max_zoom: MAX_ZOOM,
            });
        }
        let z = z as u8;
        let max = i64::from(max_index(z));

        if x < 0 || x > max || y < 0 || y > max {
            return Err(TileError::InvalidCoordinate {
                message: format!(
                    "({}, {}) out of range at zoom {} (valid range: 0-{})",
                    x, y, z, max
                ),
            });
        }

        Ok(Self {
            z,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Parse and validate coordinates taken from a request path.
    ///
    /// The row may carry a `.mvt` extension (`"5.mvt"`).
    pub fn parse(z: &str, x: &str, y: &str) -> Result<Self, TileError> {
        let y = y.strip_suffix(".mvt").unwrap_or(y);

        let parse = |name: &str, value: &str| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| TileError::InvalidCoordinate {
                    message: format!("{} is not an integer: '{}'", name, value),
                })
        };

        Self::new(parse("z", z)?, parse("x", x)?, parse("y", y)?)
    }

    /// Zoom level.
    pub fn z(&self) -> u8 {
        self.z
    }

    /// Column.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row, XYZ orientation.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Row in the archive's TMS orientation.
    pub fn tms_row(&self) -> u32 {
        xyz_to_tms(self.z, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
