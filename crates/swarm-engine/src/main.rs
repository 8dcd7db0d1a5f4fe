//! Swarm engine binary.
//!
//! This is the main entry point that wires together the configuration,
//! the coordinator, the planning oracle, and operator controls, then runs
//! the simulation loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `swarm-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the coordinator (roster, hotspots, prompt template)
//! 4. Create the planning oracle from the `llm` section
//! 5. Create operator state and install the Ctrl-C handler
//! 6. Run the simulation loop
//! 7. Log the result

mod error;
mod llm;
mod progress;

use std::path::Path;
use std::sync::Arc;

use swarm_core::config::SimulationConfig;
use swarm_core::operator::OperatorState;
use swarm_core::runner;
use swarm_core::tick::Coordinator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "swarm-config.yaml";

/// Application entry point for the swarm engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report once the subscriber is installed.
    let (config, loaded_from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_e| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("swarm-engine starting");
    if !loaded_from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        width = config.world.width,
        height = config.world.height,
        region_width = config.world.region_width,
        region_height = config.world.region_height,
        seed = config.world.seed,
        agents = config.agents.count,
        communication_range = config.communication.range,
        oracle_timeout_ms = config.planning.timeout_ms,
        "Configuration loaded"
    );

    // 3. Build the coordinator.
    let mut coordinator = Coordinator::from_config(&config).map_err(EngineError::from)?;
    for (position, text) in coordinator.hotspots().iter() {
        info!(%position, text, "Hotspot placed");
    }

    // 4. Create the planning oracle.
    let oracle = llm::create_oracle(&config.llm)?;
    info!(
        backend = oracle.name(),
        model = config.llm.model,
        "Planning oracle ready"
    );
    if oracle.name() != "stub" && config.llm.api_key.is_empty() {
        warn!("llm.api_key is empty, backend calls will likely be rejected");
    }

    // 5. Create operator state and stop on Ctrl-C.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, requesting stop");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the simulation.
    let mut progress = ProgressCallback::new();
    let result = runner::run_simulation(&mut coordinator, &oracle, &operator, &mut progress)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    for agent in coordinator.agents() {
        info!(agent = %agent.id(), "Final grid\n{}", agent.grid().render());
    }
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        hotspots_found = progress.discovered(),
        hotspots_total = coordinator.hotspots().len(),
        cells_covered = progress.covered(),
        "swarm-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `swarm-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
/// Without a file, defaults are used with environment overrides applied.
/// The flag is `true` when the file was read.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, false))
    }
}
