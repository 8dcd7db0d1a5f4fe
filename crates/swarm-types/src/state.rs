//! The per-agent record carried inside knowledge sets.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::ids::AgentId;

/// What an agent last reported about itself.
///
/// Entries travel between agents during the communicate phase and are
/// summarized into the planning prompt. The wire names are camelCase
/// (`perceptionContext`, `inferenceResult`) and unknown fields are
/// rejected when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AgentState {
    /// The agent this record describes.
    pub id: AgentId,
    /// Where the agent was when the record was last refreshed.
    pub position: Position,
    /// Scenario text the agent observed this tick, space-separated.
    pub perception_context: String,
    /// Raw text of the agent's last inference round, empty if none.
    pub inference_result: String,
}

impl AgentState {
    /// Create a record with no observations and no inference result.
    pub const fn new(id: AgentId, position: Position) -> Self {
        Self {
            id,
            position,
            perception_context: String::new(),
            inference_result: String::new(),
        }
    }

    /// Append observed scenario text to the perception context.
    pub fn record_observation(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.perception_context.is_empty() {
            self.perception_context.push(' ');
        }
        self.perception_context.push_str(text);
    }
}
