//! Configuration loading and typed config structures for the swarm simulation.
//!
//! The canonical configuration lives in `swarm-config.yaml` at the project
//! root. Every section and field is optional; missing values fall back to
//! the defaults below. After parsing, [`SimulationConfig::validate`] checks
//! the cross-field constraints the rest of the workspace relies on.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use swarm_agents::DirectionPolicy;
use swarm_types::{GridDimensions, Position};
use swarm_world::ExplorationGrid;

use crate::scenario;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but violates a constraint.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which constraint failed.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `swarm-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Map geometry and the random seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Roster size and start positions.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Gossip range.
    #[serde(default)]
    pub communication: CommunicationConfig,

    /// Oracle timeout, direction policy, and prompt template.
    #[serde(default)]
    pub planning: PlanningConfig,

    /// Scenario hotspots.
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Run boundaries and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LLM backend configuration.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `LLM_BACKEND`, `LLM_API_URL`, `LLM_API_KEY`, `LLM_MODEL` override
    ///   the matching `llm.*` fields
    /// - `SWARM_SEED` overrides `world.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or constraint fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a constraint fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SWARM_SEED` is not a number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SWARM_SEED` is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("LLM_BACKEND") {
            self.llm.backend = val;
        }
        if let Some(val) = lookup("LLM_API_URL") {
            self.llm.api_url = val;
        }
        if let Some(val) = lookup("LLM_API_KEY") {
            self.llm.api_key = val;
        }
        if let Some(val) = lookup("LLM_MODEL") {
            self.llm.model = val;
        }
        if let Some(val) = lookup("SWARM_SEED") {
            self.world.seed = val
                .trim()
                .parse()
                .map_err(|e| invalid(format!("SWARM_SEED is not a valid seed: {e}")))?;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = self.world.map_dimensions();
        ExplorationGrid::new(map, self.world.region_dimensions())
            .map_err(|e| invalid(e.to_string()))?;

        if self.agents.count == 0 {
            return Err(invalid("agents.count must be at least 1"));
        }
        if !self.agents.start_positions.is_empty() {
            let expected = usize::try_from(self.agents.count).unwrap_or(usize::MAX);
            if self.agents.start_positions.len() != expected {
                return Err(invalid(format!(
                    "agents.start_positions lists {} positions for {} agents",
                    self.agents.start_positions.len(),
                    self.agents.count
                )));
            }
            if let Some(pos) = self
                .agents
                .start_positions
                .iter()
                .find(|pos| !map.contains(**pos))
            {
                return Err(invalid(format!("start position {pos} is outside the {map} map")));
            }
        }

        if self.communication.range == 0 {
            return Err(invalid("communication.range must be positive"));
        }
        if self.planning.timeout_ms == 0 {
            return Err(invalid("planning.timeout_ms must be positive"));
        }

        for hotspot in &self.scenario.hotspots {
            if hotspot.description.is_none() && scenario::describe(&hotspot.kind).is_none() {
                return Err(invalid(format!(
                    "hotspot kind `{}` is not in the catalog and has no description",
                    hotspot.kind
                )));
            }
        }
        Ok(())
    }
}

/// Map geometry and seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Map width in cells.
    #[serde(default = "default_map_side")]
    pub width: u32,

    /// Map height in cells.
    #[serde(default = "default_map_side")]
    pub height: u32,

    /// Region block width.
    #[serde(default = "default_region_side")]
    pub region_width: u32,

    /// Region block height.
    #[serde(default = "default_region_side")]
    pub region_height: u32,

    /// Seed for every random choice in the run.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl WorldConfig {
    /// Map size as dimensions.
    pub const fn map_dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.width, self.height)
    }

    /// Region size as dimensions.
    pub const fn region_dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.region_width, self.region_height)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_map_side(),
            height: default_map_side(),
            region_width: default_region_side(),
            region_height: default_region_side(),
            seed: default_seed(),
        }
    }
}

/// Roster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Number of agents. Ids run from 0 to `count - 1`.
    #[serde(default = "default_agent_count")]
    pub count: u32,

    /// Explicit start cells, one per agent. Empty means seeded random cells.
    #[serde(default)]
    pub start_positions: Vec<Position>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            count: default_agent_count(),
            start_positions: Vec::new(),
        }
    }
}

/// Gossip configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommunicationConfig {
    /// Two agents communicate when both axis distances are below this.
    #[serde(default = "default_range")]
    pub range: u32,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
        }
    }
}

/// Planning round configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanningConfig {
    /// Deadline for a single oracle call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How multiple direction words in one answer combine.
    #[serde(default)]
    pub direction_policy: DirectionPolicy,

    /// Optional prompt template file replacing the built-in one.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            direction_policy: DirectionPolicy::default(),
            template_path: None,
        }
    }
}

/// Scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Hotspots to place on the map.
    #[serde(default = "default_hotspots")]
    pub hotspots: Vec<HotspotConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            hotspots: default_hotspots(),
        }
    }
}

/// A single hotspot entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HotspotConfig {
    /// Catalog key, e.g. `trapped_person`.
    pub kind: String,

    /// Text perceived at the cell. Defaults to the catalog text for `kind`.
    #[serde(default)]
    pub description: Option<String>,

    /// Cell to place it on. `None` picks a free cell with the seeded RNG.
    #[serde(default)]
    pub position: Option<Position>,
}

impl HotspotConfig {
    /// A catalog hotspot at a random free cell.
    pub fn random(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            description: None,
            position: None,
        }
    }

    /// The text agents perceive, falling back to the catalog.
    pub fn text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| scenario::describe(&self.kind))
    }
}

/// Simulation boundary and pacing configuration.
///
/// A value of 0 for `max_ticks` or `max_real_time_seconds` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends.
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Pause between ticks in milliseconds.
    #[serde(default)]
    pub tick_interval_ms: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            max_real_time_seconds: 0,
            tick_interval_ms: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// LLM backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LlmConfig {
    /// Backend name: `openai`, `deepseek`, `ollama`, `anthropic`, or `stub`.
    #[serde(default = "default_llm_backend")]
    pub backend: String,

    /// Base API URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; usually supplied through `LLM_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to request per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Fixed answer used by the `stub` backend.
    #[serde(default = "default_stub_response")]
    pub stub_response: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_timeout_ms: default_request_timeout_ms(),
            stub_response: default_stub_response(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_map_side() -> u32 {
    9
}

const fn default_region_side() -> u32 {
    3
}

const fn default_seed() -> u64 {
    42
}

const fn default_agent_count() -> u32 {
    4
}

const fn default_range() -> u32 {
    4
}

const fn default_timeout_ms() -> u64 {
    7000
}

fn default_hotspots() -> Vec<HotspotConfig> {
    vec![
        HotspotConfig::random("damaged_road_bridge"),
        HotspotConfig::random("trapped_person"),
    ]
}

const fn default_max_ticks() -> u64 {
    20
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_llm_backend() -> String {
    "stub".to_owned()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_model() -> String {
    "gpt-4o-mini".to_owned()
}

const fn default_max_tokens() -> u32 {
    1024
}

const fn default_request_timeout_ms() -> u64 {
    6000
}

fn default_stub_response() -> String {
    "up".to_owned()
}
