//! The exploration ledger: per-cell visit counts aggregated into regions.
//!
//! Every agent owns one [`ExplorationGrid`] sized to the whole map. Moving
//! onto a cell calls [`ExplorationGrid::visit`]; planning asks which cell of
//! a target region has been visited least.
//!
//! # Scan order
//!
//! All whole-grid scans run row-major: `y` ascending, then `x` ascending.
//! [`ExplorationGrid::least_visited_cell_in`] keeps a running minimum over
//! that order, so among equally visited cells the first one scanned wins.

use swarm_types::{GridDimensions, Position, RegionIndex};

use crate::error::WorldError;

/// Visit counters for every cell of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationGrid {
    /// Map size.
    map: GridDimensions,
    /// Region block size.
    region: GridDimensions,
    /// Visit counts, row-major (`index = y * width + x`).
    visits: Vec<u32>,
}

impl ExplorationGrid {
    /// Create an unvisited grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] unless both map dimensions
    /// are positive, both region dimensions are positive, and each region
    /// dimension is strictly less than the matching map dimension.
    pub fn new(map: GridDimensions, region: GridDimensions) -> Result<Self, WorldError> {
        let invalid = |reason| WorldError::InvalidDimensions {
            map,
            region,
            reason,
        };

        if map.width == 0 || map.height == 0 {
            return Err(invalid("map dimensions must be positive"));
        }
        if region.width == 0 || region.height == 0 {
            return Err(invalid("region dimensions must be positive"));
        }
        if region.width >= map.width || region.height >= map.height {
            return Err(invalid(
                "region dimensions must be smaller than map dimensions",
            ));
        }
        if i32::try_from(map.width).is_err() || i32::try_from(map.height).is_err() {
            return Err(invalid("map dimensions exceed the coordinate range"));
        }
        let cells = map
            .cell_count()
            .ok_or_else(|| invalid("map has too many cells"))?;

        Ok(Self {
            map,
            region,
            visits: vec![0; cells],
        })
    }

    /// The map size this grid covers.
    pub const fn map_dimensions(&self) -> GridDimensions {
        self.map
    }

    /// The region block size.
    pub const fn region_dimensions(&self) -> GridDimensions {
        self.region
    }

    /// The region containing `position`: `(ceil(y / h), ceil(x / w))`.
    pub fn region_of(&self, position: Position) -> RegionIndex {
        RegionIndex::containing(position, self.region)
    }

    /// Number of region indices along each axis, as `(rows, cols)`.
    ///
    /// Region indices run from 0 up to, but excluding, these values.
    pub fn region_span(&self) -> RegionIndex {
        let corner = Position::new(
            last_coordinate(self.map.width),
            last_coordinate(self.map.height),
        );
        let last = self.region_of(corner);
        RegionIndex::new(last.row.saturating_add(1), last.col.saturating_add(1))
    }

    /// Increment the visit counter at `position` and return the new count.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the map.
    pub fn visit(&mut self, position: Position) -> Result<u32, WorldError> {
        let index = self.index_of(position)?;
        let cell = self
            .visits
            .get_mut(index)
            .ok_or(WorldError::OutOfBounds {
                position,
                dimensions: self.map,
            })?;
        *cell = cell.saturating_add(1);
        Ok(*cell)
    }

    /// The visit counter at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the map.
    pub fn visits_at(&self, position: Position) -> Result<u32, WorldError> {
        let index = self.index_of(position)?;
        self.visits
            .get(index)
            .copied()
            .ok_or(WorldError::OutOfBounds {
                position,
                dimensions: self.map,
            })
    }

    /// Sum of visit counts over every cell in `region`.
    ///
    /// Regions with no cells (past the map edge) score 0.
    pub fn region_score(&self, region: RegionIndex) -> u64 {
        self.cells()
            .filter(|&(position, _)| self.region_of(position) == region)
            .fold(0_u64, |total, (_, count)| {
                total.saturating_add(u64::from(count))
            })
    }

    /// The least visited cell of `region`, or `None` if it has no cells.
    ///
    /// Ties keep the first cell in row-major scan order.
    pub fn least_visited_cell_in(&self, region: RegionIndex) -> Option<Position> {
        let mut best: Option<(Position, u32)> = None;
        for (position, count) in self.cells() {
            if self.region_of(position) != region {
                continue;
            }
            match best {
                Some((_, minimum)) if count >= minimum => {}
                _ => best = Some((position, count)),
            }
        }
        best.map(|(position, _)| position)
    }

    /// Total number of visits recorded on the grid.
    pub fn total_visits(&self) -> u64 {
        self.visits
            .iter()
            .fold(0_u64, |total, &count| total.saturating_add(u64::from(count)))
    }

    /// Iterate over `(position, visits)` in row-major scan order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        let width = last_coordinate(self.map.width).saturating_add(1);
        let height = last_coordinate(self.map.height).saturating_add(1);
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
            .zip(self.visits.iter().copied())
    }

    /// Render the counters as a text table with region separators.
    ///
    /// The top line is the highest `y`, so "up" reads upward.
    pub fn render(&self) -> String {
        let width = last_coordinate(self.map.width).saturating_add(1);
        let height = last_coordinate(self.map.height).saturating_add(1);
        let mut lines = Vec::new();
        let mut previous_row = None;

        for y in (0..height).rev() {
            let row = self.region_of(Position::new(0, y)).row;
            if previous_row.is_some_and(|prev| prev != row) {
                lines.push(String::from("-"));
            }
            previous_row = Some(row);

            let mut line = String::new();
            let mut previous_col = None;
            for x in 0..width {
                let position = Position::new(x, y);
                let col = self.region_of(position).col;
                if previous_col.is_some_and(|prev| prev != col) {
                    line.push_str(" |");
                }
                previous_col = Some(col);
                let count = self.visits_at(position).unwrap_or(0);
                line.push(' ');
                line.push_str(&count.to_string());
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Row-major index of `position`.
    fn index_of(&self, position: Position) -> Result<usize, WorldError> {
        let out_of_bounds = WorldError::OutOfBounds {
            position,
            dimensions: self.map,
        };
        if !self.map.contains(position) {
            return Err(out_of_bounds);
        }
        let x = usize::try_from(position.x).map_err(|_e| out_of_bounds.clone())?;
        let y = usize::try_from(position.y).map_err(|_e| out_of_bounds.clone())?;
        let width = usize::try_from(self.map.width).map_err(|_e| out_of_bounds.clone())?;
        y.checked_mul(width)
            .and_then(|row_start| row_start.checked_add(x))
            .ok_or(out_of_bounds)
    }
}

/// Largest coordinate along an axis of `extent` cells, clamped to `i32`.
fn last_coordinate(extent: u32) -> i32 {
    i32::try_from(extent.saturating_sub(1)).unwrap_or(i32::MAX)
}
