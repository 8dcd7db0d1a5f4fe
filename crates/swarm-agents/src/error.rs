//! Error types for the swarm-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! A failed operation leaves the agent and its knowledge sets unchanged.

use swarm_types::AgentId;

/// Errors that can occur during agent and knowledge-set operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// A knowledge entry was offered under a key that is not its own id.
    #[error("identity mismatch: entry for agent {state_id} offered under key {key}")]
    IdentityMismatch {
        /// The key the caller used.
        key: AgentId,
        /// The id carried by the state.
        state_id: AgentId,
    },

    /// A wire payload could not be decoded into a knowledge set.
    #[error("knowledge set deserialization failed: {reason}")]
    Deserialization {
        /// Description of what was wrong with the payload.
        reason: String,
    },

    /// A knowledge set could not be encoded.
    #[error("knowledge set serialization failed: {reason}")]
    Serialization {
        /// Description of the encoder failure.
        reason: String,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: swarm_world::WorldError,
    },
}
