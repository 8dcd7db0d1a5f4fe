//! Shared type definitions for the swarm exploration simulation.
//!
//! This crate is the single source of truth for the value types passed
//! between the world, agent, and coordinator layers.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed agent identifier
//! - [`geometry`] -- Grid positions, dimensions, and region addressing
//! - [`direction`] -- The four grid directions and their unit steps
//! - [`state`] -- The per-agent knowledge record shared through gossip

pub mod direction;
pub mod geometry;
pub mod ids;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use direction::Direction;
pub use geometry::{GridDimensions, Position, RegionIndex};
pub use ids::AgentId;
pub use state::AgentState;
