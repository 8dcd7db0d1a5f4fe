//! Error types for the swarm engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the swarm engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: swarm_core::config::ConfigError,
    },

    /// The roster, scenario, or prompt template could not be assembled.
    #[error("coordinator error: {source}")]
    Coordinator {
        /// The underlying coordinator error.
        #[from]
        source: swarm_core::tick::CoordinatorError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: swarm_core::runner::RunnerError,
    },

    /// `llm.backend` names no known backend.
    #[error("unknown LLM backend `{name}`")]
    UnknownBackend {
        /// The configured backend name.
        name: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {source}")]
    Http {
        /// The underlying reqwest error.
        #[from]
        source: reqwest::Error,
    },
}
