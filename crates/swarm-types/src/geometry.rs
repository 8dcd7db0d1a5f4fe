//! Grid coordinates, dimensions, and region addressing.
//!
//! The map is a `width x height` grid of cells addressed by integer
//! [`Position`]s. Cells are grouped into rectangular regions addressed by
//! ceiling division of the cell coordinates:
//!
//! ```text
//! row = ceil(y / region.height)
//! col = ceil(x / region.width)
//! ```
//!
//! The region tuple is therefore `(row, col)` = `(y-derived, x-derived)`,
//! while positions are always written `(x, y)`. On a 9x9 map with 3x3
//! regions the cell `x = 5, y = 8` lives in region `(3, 2)`.
//!
//! Ceiling division puts the first row and column of cells (`x == 0` or
//! `y == 0`) into their own edge regions with index 0.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// An integer grid coordinate.
///
/// Positions are plain values: arithmetic on them never fails, and the
/// component that moves an agent is responsible for keeping the result
/// inside the map (see [`GridDimensions::contains`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    /// Column coordinate, growing to the right.
    pub x: i32,
    /// Row coordinate, growing upward.
    pub y: i32,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position one cell away in `direction`.
    ///
    /// Saturates at the `i32` range; bounds against the map are checked by
    /// the caller.
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Manhattan distance between two positions.
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a rectangular block of cells.
///
/// Used both for the whole map and for the region block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridDimensions {
    /// Create dimensions from a width and a height.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `position` lies inside `[0, width) x [0, height)`.
    pub fn contains(self, position: Position) -> bool {
        let x_ok = u32::try_from(position.x).is_ok_and(|x| x < self.width);
        let y_ok = u32::try_from(position.y).is_ok_and(|y| y < self.height);
        x_ok && y_ok
    }

    /// Total number of cells, or `None` if it does not fit in `usize`.
    pub fn cell_count(self) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        width.checked_mul(height)
    }
}

impl core::fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Address of a region: `(row, col)` derived from `(y, x)`.
///
/// Indices are signed so that adjusting a region past the map edge yields
/// a region that simply contains no cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionIndex {
    /// Region row, `ceil(y / region.height)`.
    pub row: i32,
    /// Region column, `ceil(x / region.width)`.
    pub col: i32,
}

impl RegionIndex {
    /// Create a region index from its row and column.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The region containing `position` for the given region block size.
    pub fn containing(position: Position, region: GridDimensions) -> Self {
        Self {
            row: div_ceil(position.y, region.height),
            col: div_ceil(position.x, region.width),
        }
    }

    /// The neighboring region in `direction`.
    ///
    /// Up and down move along rows, left and right along columns.
    pub const fn step(self, direction: Direction) -> Self {
        let (dcol, drow) = direction.delta();
        Self {
            row: self.row.saturating_add(drow),
            col: self.col.saturating_add(dcol),
        }
    }
}

impl core::fmt::Display for RegionIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Ceiling division of a signed value by a positive divisor.
///
/// A zero divisor yields 0; callers validate divisors at construction.
fn div_ceil(value: i32, divisor: u32) -> i32 {
    let Ok(divisor) = i32::try_from(divisor) else {
        return i32::from(value > 0);
    };
    let quotient = value.checked_div(divisor).unwrap_or(0);
    let remainder = value.checked_rem(divisor).unwrap_or(0);
    if remainder > 0 {
        quotient.saturating_add(1)
    } else {
        quotient
    }
}
