//! Exploration grid, regions, and scenario hotspots for the swarm simulation.
//!
//! This crate models the physical map an agent explores: a per-cell
//! visitation ledger aggregated into regions, and the read-only scenario
//! content placed on individual cells.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid and hotspot operations.
//! - [`grid`] -- [`ExplorationGrid`]: visit counters, region scores, and
//!   least-visited cell lookup.
//! - [`hotspot`] -- [`HotspotMap`]: scenario text keyed by cell.

pub mod error;
pub mod grid;
pub mod hotspot;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::ExplorationGrid;
pub use hotspot::HotspotMap;
