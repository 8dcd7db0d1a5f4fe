//! Tick callback that reports exploration progress.
//!
//! Logs the first time any agent stands on each hotspot, and on every
//! tick the share of map cells visited by at least one agent.

use std::collections::BTreeSet;

use swarm_core::runner::TickCallback;
use swarm_core::tick::{Coordinator, TickSummary};
use swarm_types::Position;
use tracing::{debug, info};

/// Tracks discovered hotspots and swarm-wide coverage.
#[derive(Debug, Default)]
pub struct ProgressCallback {
    discovered: BTreeSet<Position>,
    covered: BTreeSet<Position>,
}

impl ProgressCallback {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hotspot cells some agent has stood on.
    pub fn discovered(&self) -> usize {
        self.discovered.len()
    }

    /// Cells visited by at least one agent.
    pub fn covered(&self) -> usize {
        self.covered.len()
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, coordinator: &Coordinator) {
        for report in summary.agents.iter().filter(|report| report.observed) {
            if self.discovered.insert(report.position) {
                info!(
                    tick = summary.tick,
                    agent = %report.agent_id,
                    position = %report.position,
                    found = self.discovered.len(),
                    total = coordinator.hotspots().len(),
                    "Hotspot discovered"
                );
            }
        }

        for agent in coordinator.agents() {
            self.covered.extend(
                agent
                    .grid()
                    .cells()
                    .filter(|&(_, visits)| visits > 0)
                    .map(|(position, _)| position),
            );
        }
        debug!(
            tick = summary.tick,
            covered = self.covered.len(),
            "Swarm coverage"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use swarm_core::config::SimulationConfig;
    use swarm_core::oracle::StubOracle;

    use super::*;

    #[tokio::test]
    async fn coverage_grows_and_never_exceeds_visits() {
        let config = SimulationConfig::default();
        let mut coordinator = Coordinator::from_config(&config).unwrap();
        let oracle = StubOracle::respond("right");
        let mut progress = ProgressCallback::new();

        for _ in 0..5 {
            let summary = coordinator.run_tick(&oracle).await.unwrap();
            progress.on_tick(&summary, &coordinator);
        }

        let visits: u64 = coordinator
            .agents()
            .iter()
            .map(|agent| agent.grid().total_visits())
            .sum();
        assert!(progress.covered() > 0);
        assert!(u64::try_from(progress.covered()).unwrap() <= visits);
        assert!(progress.discovered() <= coordinator.hotspots().len());
        assert_eq!(coordinator.settings().oracle_timeout, Duration::from_millis(7_000));
    }
}
