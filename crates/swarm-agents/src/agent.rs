//! The per-agent state machine.
//!
//! An [`Agent`] is `Idle` when its destination queue is empty and
//! `EnRoute` otherwise. Only [`Agent::step`] and
//! [`Agent::complete_planning_round`] change the queue.
//!
//! A planning round is split in two so the coordinator can await the
//! oracle without holding any half-applied state:
//!
//! 1. [`Agent::planning_context`] reads the agent and returns what the
//!    prompt needs, or `None` when there is nothing to plan from.
//! 2. [`Agent::complete_planning_round`] applies the oracle result (or its
//!    absence) and rotates the knowledge sets.
//!
//! Dropping the oracle future between the two leaves the agent untouched.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::IndexedRandom;
use swarm_types::{AgentId, Direction, GridDimensions, Position, RegionIndex};
use swarm_world::{ExplorationGrid, WorldError};
use tracing::debug;

use crate::error::AgentError;
use crate::knowledge::KnowledgeSet;
use crate::planning::{self, DirectionPolicy, PlanOutcome, PlanningContext};

/// Whether the agent has somewhere to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    /// No pending destination; the next move is a random step.
    Idle,
    /// At least one pending destination.
    EnRoute,
}

/// What a single move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stepped onto the head destination, which was popped.
    Arrived,
    /// Stepped toward the head destination without reaching it.
    Advanced,
    /// No destination was pending, so the agent stepped randomly.
    RandomStep(Direction),
    /// No in-bounds move existed.
    Stayed,
}

/// One explorer: position, private map knowledge, and gossip buffers.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    position: Position,
    grid: ExplorationGrid,
    planned: VecDeque<Position>,
    historical: KnowledgeSet,
    current: KnowledgeSet,
    /// Consecutive moves taken without a destination.
    dwell: u32,
}

impl Agent {
    /// Create an idle agent at `start` with an unvisited grid.
    ///
    /// The start cell is not counted as visited; the first visit is
    /// recorded by the first move.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::World`] if the dimensions are invalid or
    /// `start` lies outside the map.
    pub fn new(
        id: AgentId,
        map: GridDimensions,
        region: GridDimensions,
        start: Position,
    ) -> Result<Self, AgentError> {
        let grid = ExplorationGrid::new(map, region)?;
        if !map.contains(start) {
            return Err(WorldError::OutOfBounds {
                position: start,
                dimensions: map,
            }
            .into());
        }
        Ok(Self {
            id,
            position: start,
            grid,
            planned: VecDeque::new(),
            historical: KnowledgeSet::new(),
            current: KnowledgeSet::new(),
            dwell: 0,
        })
    }

    /// The agent's id.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's current cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The agent's private exploration grid.
    pub const fn grid(&self) -> &ExplorationGrid {
        &self.grid
    }

    /// The region the agent currently stands in.
    pub fn region(&self) -> RegionIndex {
        self.grid.region_of(self.position)
    }

    /// Pending destinations, head first.
    pub fn planned(&self) -> impl Iterator<Item = Position> + '_ {
        self.planned.iter().copied()
    }

    /// Idle or en route.
    pub fn mode(&self) -> AgentMode {
        if self.planned.is_empty() {
            AgentMode::Idle
        } else {
            AgentMode::EnRoute
        }
    }

    /// Consecutive moves taken while idle. Reset by any move toward a
    /// destination.
    pub const fn dwell(&self) -> u32 {
        self.dwell
    }

    /// Knowledge gathered this tick.
    pub const fn current_knowledge(&self) -> &KnowledgeSet {
        &self.current
    }

    /// Knowledge from the previous planning round.
    pub const fn historical_knowledge(&self) -> &KnowledgeSet {
        &self.historical
    }

    /// Replace the queue with a single destination.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::World`] if `destination` is outside the map.
    pub fn plan_destination(&mut self, destination: Position) -> Result<(), AgentError> {
        let map = self.grid.map_dimensions();
        if !map.contains(destination) {
            return Err(WorldError::OutOfBounds {
                position: destination,
                dimensions: map,
            }
            .into());
        }
        self.planned.clear();
        self.planned.push_back(destination);
        Ok(())
    }

    /// Move one cell and record the visit.
    ///
    /// Destinations equal to the current cell are dropped first. With a
    /// destination pending, the agent steps along the axis with the larger
    /// distance (x on ties). Otherwise it steps in a uniformly chosen
    /// in-bounds direction.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::World`] if the visit cannot be recorded.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<MoveOutcome, AgentError> {
        while self.planned.front() == Some(&self.position) {
            self.planned.pop_front();
        }

        let outcome = if let Some(&target) = self.planned.front() {
            self.dwell = 0;
            self.position = self.position.step(toward(self.position, target));
            if self.position == target {
                self.planned.pop_front();
                MoveOutcome::Arrived
            } else {
                MoveOutcome::Advanced
            }
        } else {
            let map = self.grid.map_dimensions();
            let here = self.position;
            let candidates: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|&direction| {
                    let next = here.step(direction);
                    next != here && map.contains(next)
                })
                .collect();
            self.dwell = self.dwell.saturating_add(1);
            match candidates.choose(rng) {
                Some(&direction) => {
                    self.position = here.step(direction);
                    MoveOutcome::RandomStep(direction)
                }
                None => MoveOutcome::Stayed,
            }
        };

        let visits = self.grid.visit(self.position)?;
        debug!(
            agent = %self.id,
            position = %self.position,
            visits,
            dwell = self.dwell,
            outcome = ?outcome,
            "agent moved"
        );
        Ok(outcome)
    }

    /// Record scenario text observed at the agent's cell.
    ///
    /// Returns whether anything was recorded.
    pub fn perceive(&mut self, hotspot: Option<&str>) -> bool {
        let Some(text) = hotspot else {
            return false;
        };
        let entry = self.current.entry_for(self.id, self.position);
        entry.position = self.position;
        entry.record_observation(text);
        debug!(agent = %self.id, position = %self.position, "agent perceived hotspot");
        true
    }

    /// A copy of this tick's knowledge, for pushing to neighbors.
    pub fn outgoing(&self) -> KnowledgeSet {
        self.current.clone()
    }

    /// Merge knowledge pushed by a neighbor.
    pub fn receive(&mut self, incoming: &KnowledgeSet) {
        self.current.merge_from(incoming);
    }

    /// What the prompt needs for this agent's planning round.
    ///
    /// Returns `None` when the current knowledge set is empty, in which
    /// case the round is skipped and nothing rotates.
    pub fn planning_context(&self) -> Option<PlanningContext> {
        if self.current.is_empty() {
            return None;
        }
        let region = self.region();
        Some(PlanningContext {
            agent_id: self.id,
            position: self.position,
            region,
            region_span: self.grid.region_span(),
            map: self.grid.map_dimensions(),
            region_dimensions: self.grid.region_dimensions(),
            adjacent_regions: planning::adjacent_regions(&self.grid, region),
            historical_digest: self.historical.summarize(self.id),
            current_digest: self.current.summarize(self.id),
        })
    }

    /// Apply an oracle result and rotate the knowledge sets.
    ///
    /// `Some(result)` stores the text on the agent's own entry and, when it
    /// names a reachable region, replaces the queue with that region's
    /// least visited cell. `None` (failure or timeout) clears the queue.
    /// Either way the current set becomes the historical set and the
    /// current set is emptied.
    pub fn complete_planning_round(
        &mut self,
        result: Option<&str>,
        policy: DirectionPolicy,
    ) -> PlanOutcome {
        let outcome = match result {
            Some(text) => {
                self.current.entry_for(self.id, self.position).inference_result = text.to_owned();
                let outcome = planning::resolve_target(&self.grid, self.region(), text, policy);
                if let PlanOutcome::Planned { destination, .. } = outcome {
                    self.planned.clear();
                    self.planned.push_back(destination);
                }
                outcome
            }
            None => {
                self.planned.clear();
                PlanOutcome::OracleFailed
            }
        };

        self.historical.copy_from(&self.current);
        self.current.clear();
        debug!(agent = %self.id, outcome = outcome.label(), "planning round complete");
        outcome
    }
}

/// The single step from `from` that closes the larger axis gap to `to`.
fn toward(from: Position, to: Position) -> Direction {
    let dx = from.x.abs_diff(to.x);
    let dy = from.y.abs_diff(to.y);
    if dx >= dy && dx > 0 {
        if to.x > from.x {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if to.y > from.y {
        Direction::Up
    } else {
        Direction::Down
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use swarm_types::AgentState;

    use super::*;

    fn agent_at(x: i32, y: i32) -> Agent {
        Agent::new(
            AgentId::new(1),
            GridDimensions::new(9, 9),
            GridDimensions::new(3, 3),
            Position::new(x, y),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_start_outside_map() {
        let result = Agent::new(
            AgentId::new(1),
            GridDimensions::new(9, 9),
            GridDimensions::new(3, 3),
            Position::new(9, 0),
        );
        assert!(matches!(result, Err(AgentError::World { .. })));
    }

    #[test]
    fn start_cell_is_not_visited() {
        let agent = agent_at(4, 4);
        assert_eq!(agent.grid().total_visits(), 0);
        assert_eq!(agent.mode(), AgentMode::Idle);
    }

    #[test]
    fn larger_axis_moves_first_and_ties_prefer_x() {
        assert_eq!(toward(Position::new(0, 0), Position::new(1, 3)), Direction::Up);
        assert_eq!(toward(Position::new(0, 0), Position::new(2, 2)), Direction::Right);
        assert_eq!(toward(Position::new(5, 5), Position::new(3, 4)), Direction::Left);
        assert_eq!(toward(Position::new(5, 5), Position::new(5, 1)), Direction::Down);
    }

    #[test]
    fn reaches_destination_within_manhattan_distance() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut agent = agent_at(0, 0);
        let target = Position::new(7, 5);
        agent.plan_destination(target).unwrap();

        let distance = agent.position().manhattan_distance(target);
        let mut moves = 0;
        while agent.mode() == AgentMode::EnRoute {
            let outcome = agent.step(&mut rng).unwrap();
            moves += 1;
            assert!(!matches!(outcome, MoveOutcome::RandomStep(_)));
        }
        assert_eq!(agent.position(), target);
        assert_eq!(moves, distance);
        assert_eq!(agent.grid().total_visits(), u64::from(distance));
    }

    #[test]
    fn destination_at_current_cell_is_dropped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut agent = agent_at(4, 4);
        agent.plan_destination(Position::new(4, 4)).unwrap();
        let outcome = agent.step(&mut rng).unwrap();
        assert!(matches!(outcome, MoveOutcome::RandomStep(_)));
        assert_eq!(agent.mode(), AgentMode::Idle);
    }

    #[test]
    fn random_walk_stays_on_map_and_counts_visits() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut agent = agent_at(0, 0);
        for _ in 0..200 {
            agent.step(&mut rng).unwrap();
            assert!(agent.grid().map_dimensions().contains(agent.position()));
        }
        assert_eq!(agent.grid().total_visits(), 200);
        assert_eq!(agent.dwell(), 200);
    }

    #[test]
    fn dwell_resets_when_en_route() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut agent = agent_at(4, 4);
        agent.step(&mut rng).unwrap();
        agent.step(&mut rng).unwrap();
        assert_eq!(agent.dwell(), 2);

        agent.plan_destination(Position::new(8, 8)).unwrap();
        agent.step(&mut rng).unwrap();
        assert_eq!(agent.dwell(), 0);
    }

    #[test]
    fn random_walk_is_reproducible_with_same_seed() {
        let walk = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut agent = agent_at(4, 4);
            (0..20)
                .map(|_| {
                    agent.step(&mut rng).unwrap();
                    agent.position()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(walk(3), walk(3));
    }

    #[test]
    fn perceive_accumulates_on_own_entry() {
        let mut agent = agent_at(2, 2);
        assert!(!agent.perceive(None));
        assert!(agent.current_knowledge().is_empty());

        assert!(agent.perceive(Some("A bridge is down.")));
        assert!(agent.perceive(Some("Water is rising.")));
        let entry = agent.current_knowledge().get(AgentId::new(1)).unwrap();
        assert_eq!(entry.perception_context, "A bridge is down. Water is rising.");
        assert_eq!(entry.position, Position::new(2, 2));
    }

    #[test]
    fn receive_merges_neighbor_knowledge() {
        let mut agent = agent_at(0, 0);
        let mut pushed = KnowledgeSet::new();
        let mut state = AgentState::new(AgentId::new(2), Position::new(1, 1));
        state.record_observation("Smoke.");
        pushed.add(AgentId::new(2), state).unwrap();

        agent.receive(&pushed);
        assert!(agent.current_knowledge().contains(AgentId::new(2)));
        assert!(agent.outgoing().contains(AgentId::new(2)));
    }

    #[test]
    fn planning_is_skipped_without_knowledge() {
        let agent = agent_at(4, 4);
        assert!(agent.planning_context().is_none());
    }

    #[test]
    fn planning_context_carries_digests_and_neighbors() {
        let mut agent = agent_at(4, 4);
        agent.perceive(Some("A person is trapped."));
        let context = agent.planning_context().unwrap();
        assert_eq!(context.region, RegionIndex::new(2, 2));
        assert_eq!(context.region_span, RegionIndex::new(4, 4));
        assert_eq!(context.adjacent_regions.len(), 4);
        assert!(context.current_digest.starts_with("A person is trapped."));
        assert!(context.historical_digest.is_empty());
    }

    #[test]
    fn successful_round_plans_and_rotates() {
        let mut agent = agent_at(4, 4);
        agent.perceive(Some("Smoke."));
        let outcome = agent.complete_planning_round(Some("Go up."), DirectionPolicy::default());
        assert_eq!(
            outcome,
            PlanOutcome::Planned {
                region: RegionIndex::new(3, 2),
                destination: Position::new(4, 7),
            }
        );
        assert_eq!(agent.planned().collect::<Vec<_>>(), vec![Position::new(4, 7)]);
        assert!(agent.current_knowledge().is_empty());
        let own = agent.historical_knowledge().get(AgentId::new(1)).unwrap();
        assert_eq!(own.inference_result, "Go up.");
    }

    #[test]
    fn answer_without_direction_keeps_plan() {
        let mut agent = agent_at(4, 4);
        agent.plan_destination(Position::new(0, 0)).unwrap();
        agent.perceive(Some("Smoke."));
        let outcome = agent.complete_planning_round(Some("Stay calm."), DirectionPolicy::default());
        assert_eq!(outcome, PlanOutcome::NoDirection);
        assert_eq!(agent.planned().collect::<Vec<_>>(), vec![Position::new(0, 0)]);
    }

    #[test]
    fn failed_round_goes_idle_and_still_rotates() {
        let mut agent = agent_at(4, 4);
        agent.plan_destination(Position::new(0, 0)).unwrap();
        agent.perceive(Some("Smoke."));
        let outcome = agent.complete_planning_round(None, DirectionPolicy::default());
        assert_eq!(outcome, PlanOutcome::OracleFailed);
        assert_eq!(agent.mode(), AgentMode::Idle);
        assert!(agent.current_knowledge().is_empty());
        let own = agent.historical_knowledge().get(AgentId::new(1)).unwrap();
        assert!(own.inference_result.is_empty());
    }
}
