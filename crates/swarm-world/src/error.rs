//! Error types for the `swarm-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use swarm_types::{GridDimensions, Position};

/// Errors that can occur during grid and hotspot operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The map or region dimensions cannot form a valid grid.
    #[error("invalid dimensions: map {map}, region {region}: {reason}")]
    InvalidDimensions {
        /// Requested map size.
        map: GridDimensions,
        /// Requested region block size.
        region: GridDimensions,
        /// Which constraint was violated.
        reason: &'static str,
    },

    /// A cell access fell outside the map.
    #[error("position {position} is outside the {dimensions} map")]
    OutOfBounds {
        /// The rejected position.
        position: Position,
        /// The map size.
        dimensions: GridDimensions,
    },

    /// Two hotspots were configured on the same cell.
    #[error("duplicate hotspot at {0}")]
    DuplicateHotspot(Position),

    /// There are not enough free cells left to place a hotspot.
    #[error("no free cell left for hotspot ({placed} already placed on a {dimensions} map)")]
    NoFreeCell {
        /// Hotspots placed so far.
        placed: usize,
        /// The map size.
        dimensions: GridDimensions,
    },
}
