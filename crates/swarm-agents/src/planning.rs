//! Planning rules: turning inference text into a target region.
//!
//! The oracle answers in free text. The agent scans it case-insensitively
//! for the whole words `up`, `down`, `left`, and `right` and adjusts its
//! current region accordingly. How several tokens in one answer interact
//! is a [`DirectionPolicy`].
//!
//! Region adjustments follow [`RegionIndex::step`]: `up`/`down` change the
//! row (the y-derived index), `left`/`right` change the column.

use serde::{Deserialize, Serialize};
use swarm_types::{AgentId, Direction, GridDimensions, Position, RegionIndex};
use swarm_world::ExplorationGrid;

/// How direction tokens combine when an answer contains more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPolicy {
    /// Apply every token present as an unconditional adjustment, vertical
    /// tokens first (`up`, `down`) then horizontal (`left`, `right`). Each
    /// adjustment looks up a target cell from the running region; the last
    /// successful lookup is kept, so a horizontal token refines a vertical
    /// one into the diagonal region.
    #[default]
    HorizontalWins,
    /// Only the token that occurs earliest in the text applies.
    FirstMatchWins,
    /// Answers naming more than one distinct direction yield no target.
    RejectAmbiguous,
}

/// Where a planning round left the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// A new single destination replaced the queue.
    Planned {
        /// The region the destination was chosen from.
        region: RegionIndex,
        /// The least visited cell of that region.
        destination: Position,
    },
    /// The answer named no direction; the previous plan is kept.
    NoDirection,
    /// The directions pointed at a region with no cells; the previous plan
    /// is kept.
    TargetOutsideMap {
        /// The region the tokens resolved to.
        region: RegionIndex,
    },
    /// The answer named several directions under
    /// [`DirectionPolicy::RejectAmbiguous`]; the previous plan is kept.
    Ambiguous {
        /// The distinct directions found, in text order.
        directions: Vec<Direction>,
    },
    /// The oracle failed or timed out; the queue was cleared.
    OracleFailed,
    /// The current knowledge set was empty, so no round ran.
    Skipped,
}

impl PlanOutcome {
    /// Short label for logs and summaries.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Planned { .. } => "planned",
            Self::NoDirection => "no_direction",
            Self::TargetOutsideMap { .. } => "target_outside_map",
            Self::Ambiguous { .. } => "ambiguous",
            Self::OracleFailed => "oracle_failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Score of a region next to the agent's current region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacentRegion {
    /// Which way the region lies.
    pub direction: Direction,
    /// The region index.
    pub region: RegionIndex,
    /// Total visits the agent has recorded in it.
    pub score: u64,
}

/// Everything the prompt renderer needs for one agent's planning round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningContext {
    /// The planning agent.
    pub agent_id: AgentId,
    /// Its current cell.
    pub position: Position,
    /// Its current region.
    pub region: RegionIndex,
    /// Number of region rows and columns.
    pub region_span: RegionIndex,
    /// Map size.
    pub map: GridDimensions,
    /// Region block size.
    pub region_dimensions: GridDimensions,
    /// Regions next to the current one that contain cells.
    pub adjacent_regions: Vec<AdjacentRegion>,
    /// Digest of the previous tick's knowledge.
    pub historical_digest: String,
    /// Digest of this tick's knowledge.
    pub current_digest: String,
}

/// Direction words in `text`, in order of occurrence.
///
/// Words are maximal runs of ASCII letters, so `"up,"` matches and
/// `"update"` does not.
pub fn direction_tokens(text: &str) -> Vec<Direction> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter_map(Direction::from_token)
        .collect()
}

/// Resolve inference text to a destination in the agent's own grid.
pub fn resolve_target(
    grid: &ExplorationGrid,
    origin: RegionIndex,
    text: &str,
    policy: DirectionPolicy,
) -> PlanOutcome {
    let tokens = direction_tokens(text);
    if tokens.is_empty() {
        return PlanOutcome::NoDirection;
    }

    match policy {
        DirectionPolicy::HorizontalWins => {
            let mut region = origin;
            let mut found = None;
            for direction in Direction::ALL {
                if !tokens.contains(&direction) {
                    continue;
                }
                region = region.step(direction);
                if let Some(cell) = grid.least_visited_cell_in(region) {
                    found = Some((region, cell));
                }
            }
            found.map_or(PlanOutcome::TargetOutsideMap { region }, |(region, cell)| {
                PlanOutcome::Planned {
                    region,
                    destination: cell,
                }
            })
        }
        DirectionPolicy::FirstMatchWins => tokens
            .first()
            .map_or(PlanOutcome::NoDirection, |&direction| {
                single_step(grid, origin, direction)
            }),
        DirectionPolicy::RejectAmbiguous => {
            let mut distinct: Vec<Direction> = Vec::new();
            for direction in tokens {
                if !distinct.contains(&direction) {
                    distinct.push(direction);
                }
            }
            match distinct.as_slice() {
                [direction] => single_step(grid, origin, *direction),
                _ => PlanOutcome::Ambiguous {
                    directions: distinct,
                },
            }
        }
    }
}

/// Regions adjacent to `origin` that contain at least one cell.
pub fn adjacent_regions(grid: &ExplorationGrid, origin: RegionIndex) -> Vec<AdjacentRegion> {
    Direction::ALL
        .into_iter()
        .map(|direction| (direction, origin.step(direction)))
        .filter(|&(_, region)| grid.least_visited_cell_in(region).is_some())
        .map(|(direction, region)| AdjacentRegion {
            direction,
            region,
            score: grid.region_score(region),
        })
        .collect()
}

fn single_step(grid: &ExplorationGrid, origin: RegionIndex, direction: Direction) -> PlanOutcome {
    let region = origin.step(direction);
    grid.least_visited_cell_in(region)
        .map_or(PlanOutcome::TargetOutsideMap { region }, |destination| {
            PlanOutcome::Planned {
                region,
                destination,
            }
        })
}
