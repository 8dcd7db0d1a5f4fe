//! Scenario hotspots: descriptive text attached to individual cells.
//!
//! The hotspot map is supplied by the scenario (configuration) and stays
//! read-only once the simulation starts. An agent standing on a hotspot
//! cell observes its text during the perceive phase.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use swarm_types::{GridDimensions, Position};
use tracing::debug;

use crate::error::WorldError;

/// Scenario text keyed by cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotMap {
    /// The map the hotspots are placed on.
    dimensions: GridDimensions,
    /// Hotspot text per cell.
    spots: BTreeMap<Position, String>,
}

impl HotspotMap {
    /// Create an empty hotspot map for a map of the given size.
    pub const fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            spots: BTreeMap::new(),
        }
    }

    /// Place `description` on a specific cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for cells outside the map and
    /// [`WorldError::DuplicateHotspot`] if the cell already has a hotspot.
    pub fn insert(&mut self, position: Position, description: String) -> Result<(), WorldError> {
        if !self.dimensions.contains(position) {
            return Err(WorldError::OutOfBounds {
                position,
                dimensions: self.dimensions,
            });
        }
        if self.spots.contains_key(&position) {
            return Err(WorldError::DuplicateHotspot(position));
        }
        self.spots.insert(position, description);
        Ok(())
    }

    /// Place `description` on a uniformly chosen cell that has no hotspot yet.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoFreeCell`] when every cell is taken.
    pub fn insert_random(
        &mut self,
        description: String,
        rng: &mut impl Rng,
    ) -> Result<Position, WorldError> {
        let free: Vec<Position> = self.free_cells().collect();
        let position = *free.choose(rng).ok_or(WorldError::NoFreeCell {
            placed: self.spots.len(),
            dimensions: self.dimensions,
        })?;
        debug!(%position, "hotspot placed at random cell");
        self.spots.insert(position, description);
        Ok(position)
    }

    /// The hotspot text at `position`, if any.
    pub fn get(&self, position: Position) -> Option<&str> {
        self.spots.get(&position).map(String::as_str)
    }

    /// Iterate over hotspots in position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &str)> + '_ {
        self.spots.iter().map(|(p, text)| (*p, text.as_str()))
    }

    /// Number of hotspots.
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    /// Whether no hotspots are placed.
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Cells without a hotspot, in row-major order.
    fn free_cells(&self) -> impl Iterator<Item = Position> + '_ {
        let width = i32::try_from(self.dimensions.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.dimensions.height).unwrap_or(i32::MAX);
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
            .filter(|p| !self.spots.contains_key(p))
    }
}
