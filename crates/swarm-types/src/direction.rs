//! The four grid directions.
//!
//! "Up" grows `y`, matching a plot whose origin is the bottom-left cell.

use serde::{Deserialize, Serialize};

/// A single-cell step on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `y + 1`.
    Up,
    /// `y - 1`.
    Down,
    /// `x - 1`.
    Left,
    /// `x + 1`.
    Right,
}

impl Direction {
    /// All directions in evaluation order: vertical first, then horizontal.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The `(dx, dy)` unit step for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Whether this direction moves along the y-axis.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// The lowercase word used for this direction in inference text.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a single word case-insensitively.
    pub fn from_token(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.token().eq_ignore_ascii_case(word))
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!(Direction::from_token("UP"), Some(Direction::Up));
        assert_eq!(Direction::from_token("Left"), Some(Direction::Left));
        assert_eq!(Direction::from_token("upward"), None);
    }

    #[test]
    fn vertical_directions_come_first() {
        let vertical: Vec<bool> = Direction::ALL.iter().map(|d| d.is_vertical()).collect();
        assert_eq!(vertical, vec![true, true, false, false]);
    }
}
