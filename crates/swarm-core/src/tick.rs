//! Tick cycle: the four-phase loop that drives the swarm.
//!
//! Each tick runs these phases over the whole roster, and every phase
//! finishes for all agents before the next one starts:
//!
//! 1. **Move** -- every agent takes one step (toward its destination, or a
//!    random one) and records the visit. Random steps draw from the
//!    coordinator's seeded RNG in roster order.
//!
//! 2. **Perceive** -- agents standing on a hotspot record its text in their
//!    own current knowledge entry.
//!
//! 3. **Communicate** -- every agent's outgoing knowledge is snapshotted
//!    first, then each neighbor pair exchanges snapshots. Because pushes read
//!    snapshots, knowledge travels exactly one hop per tick regardless of
//!    roster order.
//!
//! 4. **Plan** -- all agents with fresh knowledge render a prompt and ask
//!    the oracle concurrently, each call under its own deadline. A failed or
//!    timed-out call leaves that agent idle; the others are unaffected.
//!
//! The tick is deterministic given the same seed, roster, hotspots, and
//! oracle answers.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swarm_agents::{Agent, AgentError, DirectionPolicy, KnowledgeSet, MoveOutcome, PlanOutcome};
use swarm_types::{AgentId, GridDimensions, Position, RegionIndex};
use swarm_world::HotspotMap;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::neighbor;
use crate::oracle::{InferenceOracle, OracleError};
use crate::prompt::{PromptEngine, PromptError};
use crate::scenario::{self, ScenarioError};

/// Errors that can occur while assembling a coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The configuration is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// An agent could not be created.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// Two agents share an id.
    #[error("duplicate agent id {agent_id}")]
    DuplicateAgent {
        /// The repeated id.
        agent_id: AgentId,
    },

    /// Hotspot placement failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: ScenarioError,
    },

    /// The prompt template could not be loaded.
    #[error("prompt error: {source}")]
    Prompt {
        /// The underlying prompt error.
        #[from]
        source: PromptError,
    },
}

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// An agent operation failed.
    #[error("agent error for {agent_id}: {source}")]
    Agent {
        /// The agent that caused the error.
        agent_id: AgentId,
        /// The underlying agent error.
        source: AgentError,
    },
}

/// Tunables the tick reads from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    /// Neighbor box size for the communicate phase.
    pub communication_range: u32,
    /// Per-call oracle deadline.
    pub oracle_timeout: Duration,
    /// How direction words in an answer combine.
    pub direction_policy: DirectionPolicy,
}

impl TickSettings {
    /// Settings taken from a loaded configuration.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            communication_range: config.communication.range,
            oracle_timeout: Duration::from_millis(config.planning.timeout_ms),
            direction_policy: config.planning.direction_policy,
        }
    }
}

/// What happened to one agent during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTickReport {
    /// The agent.
    pub agent_id: AgentId,
    /// Its cell after the move phase.
    pub position: Position,
    /// The region of that cell.
    pub region: RegionIndex,
    /// How it moved.
    pub movement: MoveOutcome,
    /// Whether it observed a hotspot.
    pub observed: bool,
    /// Result of its planning round.
    pub plan: PlanOutcome,
    /// Consecutive idle moves after this tick's move.
    pub dwell: u32,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed, starting at 1.
    pub tick: u64,
    /// Per-agent reports in roster order.
    pub agents: Vec<AgentTickReport>,
    /// Neighbor pairs that exchanged knowledge, lower roster index first.
    pub links: Vec<(AgentId, AgentId)>,
}

impl TickSummary {
    /// Number of agents that observed a hotspot.
    pub fn observations(&self) -> usize {
        self.agents.iter().filter(|report| report.observed).count()
    }

    /// Number of agents that received a new destination.
    pub fn planned(&self) -> usize {
        self.agents
            .iter()
            .filter(|report| matches!(report.plan, PlanOutcome::Planned { .. }))
            .count()
    }

    /// Number of agents whose oracle round failed or timed out.
    pub fn oracle_failures(&self) -> usize {
        self.agents
            .iter()
            .filter(|report| report.plan == PlanOutcome::OracleFailed)
            .count()
    }
}

/// Owns the roster and the scenario and runs ticks over them.
#[derive(Debug)]
pub struct Coordinator {
    agents: Vec<Agent>,
    hotspots: HotspotMap,
    prompts: PromptEngine,
    settings: TickSettings,
    rng: StdRng,
    tick: u64,
}

impl Coordinator {
    /// Assemble a coordinator from parts.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::DuplicateAgent`] if two agents share an id.
    pub fn new(
        agents: Vec<Agent>,
        hotspots: HotspotMap,
        prompts: PromptEngine,
        settings: TickSettings,
        seed: u64,
    ) -> Result<Self, CoordinatorError> {
        Self::assemble(
            agents,
            hotspots,
            prompts,
            settings,
            StdRng::seed_from_u64(seed),
        )
    }

    fn assemble(
        agents: Vec<Agent>,
        hotspots: HotspotMap,
        prompts: PromptEngine,
        settings: TickSettings,
        rng: StdRng,
    ) -> Result<Self, CoordinatorError> {
        let mut seen = BTreeSet::new();
        if let Some(agent) = agents.iter().find(|agent| !seen.insert(agent.id())) {
            return Err(CoordinatorError::DuplicateAgent {
                agent_id: agent.id(),
            });
        }
        Ok(Self {
            agents,
            hotspots,
            prompts,
            settings,
            rng,
            tick: 0,
        })
    }

    /// Build the roster, scenario, and prompt engine described by `config`.
    ///
    /// One RNG seeded from `world.seed` chooses random start cells, then
    /// random hotspot cells, then drives every random step of the run.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] if the configuration is invalid, a
    /// hotspot cannot be placed, or the prompt template cannot be loaded.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let map = config.world.map_dimensions();
        let region = config.world.region_dimensions();
        let mut rng = StdRng::seed_from_u64(config.world.seed);

        let mut agents = Vec::new();
        for index in 0..config.agents.count {
            let explicit = usize::try_from(index)
                .ok()
                .and_then(|i| config.agents.start_positions.get(i));
            let start = match explicit {
                Some(&position) => position,
                None => random_cell(map, &mut rng)?,
            };
            let agent = Agent::new(AgentId::new(index), map, region, start)?;
            info!(agent = %agent.id(), position = %start, "agent created");
            agents.push(agent);
        }

        let hotspots = scenario::build_hotspots(&config.scenario.hotspots, map, &mut rng)?;
        let prompts = PromptEngine::load(config.planning.template_path.as_deref())?;

        Self::assemble(
            agents,
            hotspots,
            prompts,
            TickSettings::from_config(config),
            rng,
        )
    }

    /// The roster in index order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The agent with `id`, if present.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// The scenario hotspots.
    pub const fn hotspots(&self) -> &HotspotMap {
        &self.hotspots
    }

    /// The number of ticks executed so far.
    ///
    /// Only completed ticks count: a [`Coordinator::run_tick`] future
    /// dropped before it resolves leaves this unchanged.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The active tick settings.
    pub const fn settings(&self) -> TickSettings {
        self.settings
    }

    /// Execute one complete tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Agent`] if an agent cannot record its move.
    pub async fn run_tick<O: InferenceOracle>(
        &mut self,
        oracle: &O,
    ) -> Result<TickSummary, TickError> {
        let tick = self.tick.saturating_add(1);

        // Phase 1: move.
        let mut movements = Vec::with_capacity(self.agents.len());
        for agent in &mut self.agents {
            let movement = agent.step(&mut self.rng).map_err(|source| TickError::Agent {
                agent_id: agent.id(),
                source,
            })?;
            movements.push(movement);
        }
        debug!(tick, agents = self.agents.len(), "move phase complete");

        // Phase 2: perceive.
        let mut observed = Vec::with_capacity(self.agents.len());
        for agent in &mut self.agents {
            let hotspot = self.hotspots.get(agent.position());
            observed.push(agent.perceive(hotspot));
        }
        debug!(
            tick,
            observations = observed.iter().filter(|seen| **seen).count(),
            "perceive phase complete"
        );

        // Phase 3: communicate.
        let links = self.communicate();
        debug!(tick, links = links.len(), "communicate phase complete");

        // Phase 4: plan.
        let prompts = &self.prompts;
        let settings = self.settings;
        let rounds = self
            .agents
            .iter_mut()
            .map(|agent| plan_round(agent, prompts, oracle, settings));
        let plans = join_all(rounds).await;

        self.tick = tick;
        let reports: Vec<AgentTickReport> = self
            .agents
            .iter()
            .zip(movements)
            .zip(observed)
            .zip(plans)
            .map(|(((agent, movement), observed), plan)| AgentTickReport {
                agent_id: agent.id(),
                position: agent.position(),
                region: agent.region(),
                movement,
                observed,
                plan,
                dwell: agent.dwell(),
            })
            .collect();

        for agent in &self.agents {
            trace!(tick, agent = %agent.id(), grid = %agent.grid().render(), "agent grid");
        }

        let summary = TickSummary {
            tick,
            agents: reports,
            links,
        };
        info!(
            tick,
            observations = summary.observations(),
            links = summary.links.len(),
            planned = summary.planned(),
            oracle_failures = summary.oracle_failures(),
            "tick complete"
        );
        Ok(summary)
    }

    /// Snapshot every outgoing set, then push snapshots across each
    /// neighbor pair. Returns the pairs as agent ids.
    fn communicate(&mut self) -> Vec<(AgentId, AgentId)> {
        let snapshots: Vec<KnowledgeSet> = self.agents.iter().map(Agent::outgoing).collect();
        let positions: Vec<Position> = self.agents.iter().map(Agent::position).collect();
        let pairs = neighbor::neighbor_pairs(&positions, self.settings.communication_range);

        let mut links = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            let (Some(from_i), Some(from_j)) = (snapshots.get(i), snapshots.get(j)) else {
                continue;
            };
            let mut ids = (None, None);
            if let Some(agent) = self.agents.get_mut(j) {
                agent.receive(from_i);
                ids.1 = Some(agent.id());
            }
            if let Some(agent) = self.agents.get_mut(i) {
                agent.receive(from_j);
                ids.0 = Some(agent.id());
            }
            if let (Some(a), Some(b)) = ids {
                debug!(from = %a, to = %b, "agents exchanged knowledge");
                links.push((a, b));
            }
        }
        links
    }
}

/// One agent's planning round: context, prompt, bounded oracle call,
/// completion. The agent is only mutated after the call resolves.
async fn plan_round<O: InferenceOracle>(
    agent: &mut Agent,
    prompts: &PromptEngine,
    oracle: &O,
    settings: TickSettings,
) -> PlanOutcome {
    let Some(context) = agent.planning_context() else {
        return PlanOutcome::Skipped;
    };

    let answer = match prompts.render(&context) {
        Ok(prompt) => ask(oracle, &prompt, settings.oracle_timeout, agent.id()).await,
        Err(e) => {
            warn!(agent = %agent.id(), error = %e, "prompt render failed");
            None
        }
    };
    agent.complete_planning_round(answer.as_deref(), settings.direction_policy)
}

/// Call the oracle under `deadline`, logging and flattening failures.
async fn ask<O: InferenceOracle>(
    oracle: &O,
    prompt: &str,
    deadline: Duration,
    agent_id: AgentId,
) -> Option<String> {
    match timeout(deadline, oracle.infer(prompt)).await {
        Ok(Ok(answer)) => {
            debug!(agent = %agent_id, answer = %answer, "oracle answered");
            Some(answer)
        }
        Ok(Err(e)) => {
            warn!(agent = %agent_id, error = %e, "oracle call failed");
            None
        }
        Err(_elapsed) => {
            let e = OracleError::Timeout {
                deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            };
            warn!(agent = %agent_id, error = %e, "oracle call timed out");
            None
        }
    }
}

/// A uniformly random cell of `map`.
fn random_cell<R: Rng>(map: GridDimensions, rng: &mut R) -> Result<Position, ConfigError> {
    let to_coordinate = |value: u32| {
        i32::try_from(value).map_err(|_e| ConfigError::Invalid {
            reason: format!("map {map} exceeds the coordinate range"),
        })
    };
    let x = to_coordinate(rng.random_range(0..map.width))?;
    let y = to_coordinate(rng.random_range(0..map.height))?;
    Ok(Position::new(x, y))
}
