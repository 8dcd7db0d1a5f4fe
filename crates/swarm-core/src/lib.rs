//! Tick cycle, inference oracle seam, and orchestration for the swarm
//! simulation.
//!
//! This crate owns the four-phase tick that drives the swarm: Move,
//! Perceive, Communicate, and Plan.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `swarm-config.yaml` into
//!   strongly-typed structs.
//! - [`neighbor`] -- Communication-range test and neighbor pair discovery.
//! - [`operator`] -- Pause, resume, stop, and run bounds.
//! - [`oracle`] -- [`InferenceOracle`] trait with stub and closure oracles.
//! - [`prompt`] -- Planning prompt templates rendered with `minijinja`.
//! - [`runner`] -- The bounded simulation loop.
//! - [`scenario`] -- Hotspot text catalog and placement.
//! - [`tick`] -- The [`Coordinator`] and its four-phase tick.
//!
//! [`InferenceOracle`]: oracle::InferenceOracle
//! [`Coordinator`]: tick::Coordinator

pub mod config;
pub mod neighbor;
pub mod operator;
pub mod oracle;
pub mod prompt;
pub mod runner;
pub mod scenario;
pub mod tick;
