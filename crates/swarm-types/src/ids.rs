//! Type-safe identifier for agents.
//!
//! Agents are numbered from zero when the roster is built and keep their
//! number for the whole run. The wrapper keeps agent numbers from being
//! mixed up with coordinates or counters at compile time.

use serde::{Deserialize, Serialize};

/// Unique identifier for an agent in the swarm.
///
/// Serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Create an identifier from its numeric value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the inner numeric value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for AgentId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

impl From<u32> for AgentId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_serializes_as_integer() {
        let json = serde_json::to_string(&AgentId::new(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
    }

    #[test]
    fn id_display_and_parse_agree() {
        let id = AgentId::new(12);
        let parsed: Result<AgentId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
        assert!("twelve".parse::<AgentId>().is_err());
    }
}
