//! Agent state, knowledge sets, and planning rules for the swarm simulation.
//!
//! This crate contains the logic layer for agents -- everything that
//! operates on agent state without touching I/O. It sits between
//! `swarm-types`/`swarm-world` (data and map) and `swarm-core` (tick
//! orchestration and the inference oracle).
//!
//! # Modules
//!
//! - [`agent`] -- The per-agent state machine ([`Agent`]): move, perceive,
//!   communicate, and the two halves of a planning round.
//! - [`error`] -- Error types for agent operations ([`AgentError`]).
//! - [`knowledge`] -- [`KnowledgeSet`]: merge, copy, digest, wire codec.
//! - [`planning`] -- Direction-token parsing, precedence policy, and the
//!   [`PlanningContext`] handed to the prompt renderer.

pub mod agent;
pub mod error;
pub mod knowledge;
pub mod planning;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentMode, MoveOutcome};
pub use error::AgentError;
pub use knowledge::KnowledgeSet;
pub use planning::{AdjacentRegion, DirectionPolicy, PlanOutcome, PlanningContext};
