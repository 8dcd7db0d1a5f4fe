//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] drives [`Coordinator::run_tick`] until a bound is hit
//! or the operator stops the run:
//!
//! - **Bounded run**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: the loop sleeps while paused
//! - **Operator stop**: checked before every tick, and a stop that arrives
//!   mid-tick drops the in-flight oracle calls
//!
//! Dropping a tick mid-plan is safe: agents whose oracle call has not
//! resolved have not been touched yet.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::operator::{OperatorState, SimulationEndReason};
use crate::oracle::InferenceOracle;
use crate::tick::{Coordinator, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, coordinator: &Coordinator);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _coordinator: &Coordinator) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub async fn run_simulation<O: InferenceOracle>(
    coordinator: &mut Coordinator,
    oracle: &O,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        agents = coordinator.agents().len(),
        hotspots = coordinator.hotspots().len(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    let end_reason = loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        // --- Execute tick, abandoning it if a stop arrives mid-flight ---
        let summary = tokio::select! {
            result = coordinator.run_tick(oracle) => result?,
            () = operator.stopped() => {
                info!("Tick abandoned on operator stop");
                break SimulationEndReason::OperatorStop;
            }
        };
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, coordinator);

        // --- Check tick limit (after tick) ---
        let reached = operator.tick_limit_reached(summary.tick);
        last_summary = Some(summary);
        if reached {
            info!(max_ticks = operator.max_ticks(), "Tick limit reached");
            break SimulationEndReason::MaxTicksReached;
        }

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    };

    operator.set_end_reason(end_reason).await;
    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        for report in &summary.agents {
            info!(
                agent = %report.agent_id,
                position = %report.position,
                region = %report.region,
                dwell = report.dwell,
                "Final agent state"
            );
        }
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
