//! Integration tests for the swarm tick cycle.
//!
//! These drive [`Coordinator`] through whole ticks with in-process oracles:
//! gossip between two agents, per-call oracle deadlines under paused time,
//! an operator stop that lands mid-tick, and replay of a seeded run.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use swarm_agents::{Agent, AgentMode, DirectionPolicy, PlanOutcome};
use swarm_core::config::{SimulationBoundsConfig, SimulationConfig};
use swarm_core::operator::{OperatorState, SimulationEndReason};
use swarm_core::oracle::{InferenceOracle, OracleError, StubOracle};
use swarm_core::prompt::PromptEngine;
use swarm_core::runner::{self, NoOpCallback, TickCallback};
use swarm_core::tick::{Coordinator, TickSettings, TickSummary};
use swarm_types::{AgentId, GridDimensions, Position, RegionIndex};
use swarm_world::HotspotMap;

const MAP: GridDimensions = GridDimensions::new(9, 9);
const REGION: GridDimensions = GridDimensions::new(3, 3);

fn settings(timeout_ms: u64) -> TickSettings {
    TickSettings {
        communication_range: 4,
        oracle_timeout: Duration::from_millis(timeout_ms),
        direction_policy: DirectionPolicy::HorizontalWins,
    }
}

/// Agents that each take a single deterministic step on the first tick.
fn stepping_agents(moves: &[((i32, i32), (i32, i32))]) -> Vec<Agent> {
    moves
        .iter()
        .enumerate()
        .map(|(i, &((x, y), (tx, ty)))| {
            let mut agent = Agent::new(
                AgentId::new(u32::try_from(i).unwrap()),
                MAP,
                REGION,
                Position::new(x, y),
            )
            .unwrap();
            agent.plan_destination(Position::new(tx, ty)).unwrap();
            agent
        })
        .collect()
}

/// Answers after `delay` for the listed agents and immediately for the rest.
struct SlowFor {
    slow_agents: Vec<u32>,
    delay: Duration,
    answer: &'static str,
}

impl InferenceOracle for SlowFor {
    async fn infer(&self, prompt: &str) -> Result<String, OracleError> {
        let slow = self
            .slow_agents
            .iter()
            .any(|id| prompt.contains(&format!("agent {id} ")));
        if slow {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.answer.to_owned())
    }
}

#[tokio::test]
async fn observation_reaches_neighbor_and_rotates_after_planning() {
    // Agent 0 steps onto the hotspot; agent 1 ends two columns away.
    let agents = stepping_agents(&[((4, 3), (4, 4)), ((2, 3), (2, 4))]);
    let mut hotspots = HotspotMap::new(MAP);
    hotspots
        .insert(Position::new(4, 4), "A person is trapped.".to_owned())
        .unwrap();
    let mut coordinator = Coordinator::new(
        agents,
        hotspots,
        PromptEngine::builtin().unwrap(),
        settings(1_000),
        9,
    )
    .unwrap();

    let summary = coordinator
        .run_tick(&StubOracle::respond("up"))
        .await
        .unwrap();

    assert_eq!(summary.links, vec![(AgentId::new(0), AgentId::new(1))]);
    assert_eq!(summary.observations(), 1);

    let observer = coordinator.agent(AgentId::new(0)).unwrap();
    assert!(!observer.historical_knowledge().is_empty());
    assert!(observer.current_knowledge().is_empty());
    let entry = observer
        .historical_knowledge()
        .get(AgentId::new(0))
        .unwrap();
    assert!(entry.perception_context.contains("A person is trapped"));
    assert_eq!(entry.inference_result, "up");

    let peer = coordinator.agent(AgentId::new(1)).unwrap();
    let relayed = peer.historical_knowledge().get(AgentId::new(0)).unwrap();
    assert_eq!(relayed.position, Position::new(4, 4));
    assert!(peer.current_knowledge().is_empty());

    assert_eq!(
        summary.agents[0].plan,
        PlanOutcome::Planned {
            region: RegionIndex::new(3, 2),
            destination: Position::new(4, 7),
        }
    );
    assert_eq!(
        summary.agents[1].plan,
        PlanOutcome::Planned {
            region: RegionIndex::new(3, 1),
            destination: Position::new(1, 7),
        }
    );
    assert_eq!(observer.mode(), AgentMode::EnRoute);
}

#[tokio::test(start_paused = true)]
async fn slow_oracle_times_out_without_blocking_peers() {
    let agents = stepping_agents(&[((4, 3), (4, 4)), ((2, 3), (2, 4))]);
    let mut hotspots = HotspotMap::new(MAP);
    hotspots.insert(Position::new(4, 4), "Smoke.".to_owned()).unwrap();
    let mut coordinator = Coordinator::new(
        agents,
        hotspots,
        PromptEngine::builtin().unwrap(),
        settings(500),
        9,
    )
    .unwrap();
    let oracle = SlowFor {
        slow_agents: vec![0],
        delay: Duration::from_secs(30),
        answer: "right",
    };

    let started = tokio::time::Instant::now();
    let summary = coordinator.run_tick(&oracle).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(summary.agents[0].plan, PlanOutcome::OracleFailed);
    assert!(matches!(summary.agents[1].plan, PlanOutcome::Planned { .. }));
    assert_eq!(summary.oracle_failures(), 1);

    // The timed-out agent is idle with its knowledge rotated, not half-merged.
    let slow = coordinator.agent(AgentId::new(0)).unwrap();
    assert_eq!(slow.mode(), AgentMode::Idle);
    assert!(slow.current_knowledge().is_empty());
    let entry = slow.historical_knowledge().get(AgentId::new(0)).unwrap();
    assert!(entry.inference_result.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_during_planning_drops_the_tick() {
    // Agent 0 passes over the hotspot on its way to (4, 7).
    let agents = stepping_agents(&[((4, 2), (4, 7))]);
    let mut hotspots = HotspotMap::new(MAP);
    hotspots.insert(Position::new(4, 3), "Smoke.".to_owned()).unwrap();
    let mut coordinator = Coordinator::new(
        agents,
        hotspots,
        PromptEngine::builtin().unwrap(),
        settings(60_000),
        9,
    )
    .unwrap();
    let oracle = SlowFor {
        slow_agents: vec![0],
        delay: Duration::from_secs(30),
        answer: "left",
    };
    let operator = Arc::new(OperatorState::new(&SimulationBoundsConfig {
        max_ticks: 0,
        ..SimulationBoundsConfig::default()
    }));
    let stopper = {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            operator.request_stop();
        })
    };

    let started = tokio::time::Instant::now();
    let result = runner::run_simulation(&mut coordinator, &oracle, &operator, &mut NoOpCallback)
        .await
        .unwrap();
    stopper.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
    assert_eq!(result.total_ticks, 0);
    assert!(result.final_summary.is_none());
    assert_eq!(operator.end_reason().await, Some(SimulationEndReason::OperatorStop));
    // Only completed ticks are counted.
    assert_eq!(coordinator.tick(), 0);

    // The move and perception stand; the planning round never completed.
    let agent = coordinator.agent(AgentId::new(0)).unwrap();
    assert_eq!(agent.position(), Position::new(4, 3));
    assert_eq!(agent.grid().total_visits(), 1);
    assert_eq!(agent.current_knowledge().len(), 1);
    let own = agent.current_knowledge().get(AgentId::new(0)).unwrap();
    assert!(own.perception_context.contains("Smoke"));
    assert!(own.inference_result.is_empty());
    assert!(agent.historical_knowledge().is_empty());
    assert_eq!(agent.planned().collect::<Vec<_>>(), vec![Position::new(4, 7)]);
    assert_eq!(agent.mode(), AgentMode::EnRoute);
}

fn replay_config() -> SimulationConfig {
    SimulationConfig::parse(
        "
world:
  seed: 2024
agents:
  count: 3
scenario:
  hotspots:
    - kind: damaged_road_bridge
    - kind: trapped_person
    - kind: collapsed_buildings
",
    )
    .unwrap()
}

struct Recorder {
    summaries: Vec<TickSummary>,
}

impl TickCallback for Recorder {
    fn on_tick(&mut self, summary: &TickSummary, _coordinator: &Coordinator) {
        self.summaries.push(summary.clone());
    }
}

async fn record_run(config: &SimulationConfig, ticks: u64) -> Vec<TickSummary> {
    let mut coordinator = Coordinator::from_config(config).unwrap();
    let mut bounds = config.simulation.clone();
    bounds.max_ticks = ticks;
    let operator = Arc::new(OperatorState::new(&bounds));
    let mut recorder = Recorder {
        summaries: Vec::new(),
    };
    let result = runner::run_simulation(
        &mut coordinator,
        &StubOracle::respond("right, then up"),
        &operator,
        &mut recorder,
    )
    .await
    .unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
    recorder.summaries
}

#[tokio::test]
async fn seeded_runs_replay_identically() {
    let config = replay_config();
    let first = record_run(&config, 25).await;
    let second = record_run(&config, 25).await;
    assert_eq!(first.len(), 25);
    assert_eq!(first, second);
}

#[tokio::test]
async fn different_seeds_diverge() {
    let config = replay_config();
    let mut other = replay_config();
    other.world.seed = 2025;
    let first = record_run(&config, 10).await;
    let second = record_run(&other, 10).await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn visits_accumulate_once_per_tick() {
    let mut coordinator = Coordinator::from_config(&replay_config()).unwrap();
    let mut bounds = replay_config().simulation;
    bounds.max_ticks = 12;
    let operator = Arc::new(OperatorState::new(&bounds));
    let result = runner::run_simulation(
        &mut coordinator,
        &StubOracle::fail("offline"),
        &operator,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(result.total_ticks, 12);
    for agent in coordinator.agents() {
        assert_eq!(agent.grid().total_visits(), 12);
        assert!(MAP.contains(agent.position()));
    }
}
