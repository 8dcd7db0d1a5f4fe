//! Knowledge sets: what an agent knows about itself and its peers.
//!
//! A [`KnowledgeSet`] maps each [`AgentId`] to the latest [`AgentState`]
//! received for it. Agents keep two: the *current* set filled during a tick
//! (own perception plus gossip from neighbors) and the *historical* set,
//! a copy of the previous tick's current set.
//!
//! # Merge semantics
//!
//! [`KnowledgeSet::merge_from`] overwrites per key with no timestamp
//! comparison: the last applied entry wins. The protocol carries at most
//! one update per agent per tick, and the coordinator applies every push
//! before any agent reads its set.
//!
//! # Wire format
//!
//! A JSON object keyed by the decimal agent id:
//!
//! ```text
//! {"1": {"id": 1, "position": {"x": 1, "y": 1},
//!        "perceptionContext": "...", "inferenceResult": "..."}}
//! ```
//!
//! Decoding validates the schema and the key/id pairing and either returns
//! the whole set or an error; it never yields a partial set.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use swarm_types::{AgentId, AgentState, Position};

use crate::error::AgentError;

/// Mapping from agent id to that agent's latest known state.
///
/// Iteration runs in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeSet {
    entries: BTreeMap<AgentId, AgentState>,
}

impl KnowledgeSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Whether the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace this set's contents with a copy of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.entries.clone_from(&other.entries);
    }

    /// Overwrite this set's entry for every id present in `other`.
    ///
    /// Entries absent from `other` are kept.
    pub fn merge_from(&mut self, other: &Self) {
        for (id, state) in &other.entries {
            self.entries.insert(*id, state.clone());
        }
    }

    /// Insert `state` under `id`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::IdentityMismatch`] if `state.id != id`; the set
    /// is left unchanged.
    pub fn add(&mut self, id: AgentId, state: AgentState) -> Result<(), AgentError> {
        if state.id != id {
            return Err(AgentError::IdentityMismatch {
                key: id,
                state_id: state.id,
            });
        }
        self.entries.insert(id, state);
        Ok(())
    }

    /// The entry for `id`, if present.
    pub fn get(&self, id: AgentId) -> Option<&AgentState> {
        self.entries.get(&id)
    }

    /// The entry for `id`, created at `position` with empty text if absent.
    pub fn entry_for(&mut self, id: AgentId, position: Position) -> &mut AgentState {
        self.entries
            .entry(id)
            .or_insert_with(|| AgentState::new(id, position))
    }

    /// Whether the set holds an entry for `id`.
    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Iterate over entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentState> + '_ {
        self.entries.values()
    }

    /// Build the natural-language digest handed to the inference oracle.
    ///
    /// When the set holds `self_id`, the digest opens with that agent's own
    /// perception text. Every entry (self included) then contributes
    /// `peer <id> has observed that <perception>.` and, when it carries an
    /// inference result, `peer <id> has planned the following response:
    /// <result>`. A trailing period on the perception is not doubled, and
    /// an entry with no perception reads `peer <id> has observed nothing
    /// new.`. Lines are joined with `\n`; an empty set yields `""`.
    pub fn summarize(&self, self_id: AgentId) -> String {
        let mut lines = Vec::new();

        if let Some(own) = self.entries.get(&self_id)
            && !own.perception_context.is_empty()
        {
            lines.push(own.perception_context.clone());
        }

        for state in self.entries.values() {
            let observed = state.perception_context.trim_end_matches('.');
            if observed.is_empty() {
                lines.push(format!("peer {} has observed nothing new.", state.id));
            } else {
                lines.push(format!("peer {} has observed that {observed}.", state.id));
            }
            if !state.inference_result.is_empty() {
                lines.push(format!(
                    "peer {} has planned the following response: {}",
                    state.id, state.inference_result
                ));
            }
        }

        lines.join("\n")
    }

    /// Encode the set in the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Serialization`] if the encoder fails.
    pub fn encode(&self) -> Result<String, AgentError> {
        let keyed: BTreeMap<String, &AgentState> = self
            .entries
            .iter()
            .map(|(id, state)| (id.to_string(), state))
            .collect();
        serde_json::to_string(&keyed).map_err(|e| AgentError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Decode a set from the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Deserialization`] for malformed JSON, unknown
    /// or missing fields, non-numeric keys, a key that differs from the
    /// entry's `id`, or an agent listed more than once.
    pub fn decode(payload: &str) -> Result<Self, AgentError> {
        let WireEntries(entries) =
            serde_json::from_str(payload).map_err(|e| AgentError::Deserialization {
                reason: e.to_string(),
            })?;
        Ok(Self { entries })
    }
}

/// The top-level wire object, checked key by key while it is read.
struct WireEntries(BTreeMap<AgentId, AgentState>);

impl<'de> Deserialize<'de> for WireEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(WireVisitor)
    }
}

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = WireEntries;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object keyed by agent id")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some(key) = access.next_key::<String>()? {
            let id: AgentId = key
                .parse()
                .map_err(|e| A::Error::custom(format!("key {key:?} is not an agent id: {e}")))?;
            let state: AgentState = access.next_value()?;
            if id != state.id {
                return Err(A::Error::custom(format!(
                    "key {id} holds the entry of agent {}",
                    state.id
                )));
            }
            if entries.insert(id, state).is_some() {
                return Err(A::Error::custom(format!("agent {id} is listed more than once")));
            }
        }
        Ok(WireEntries(entries))
    }
}

impl FromIterator<AgentState> for KnowledgeSet {
    fn from_iter<I: IntoIterator<Item = AgentState>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|state| (state.id, state)).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state(id: u32, text: &str, result: &str) -> AgentState {
        AgentState {
            id: AgentId::new(id),
            position: Position::new(1, 1),
            perception_context: text.to_owned(),
            inference_result: result.to_owned(),
        }
    }

    fn two_agent_set() -> KnowledgeSet {
        let mut set = KnowledgeSet::new();
        set.add(AgentId::new(1), state(1, "Perception Context", "Inference Result"))
            .unwrap();
        set.add(AgentId::new(2), state(2, "Perception Context 2", "Inference Result 2"))
            .unwrap();
        set
    }

    #[test]
    fn add_rejects_mismatched_identity() {
        let mut set = KnowledgeSet::new();
        let result = set.add(AgentId::new(2), state(1, "x", ""));
        assert_eq!(
            result,
            Err(AgentError::IdentityMismatch {
                key: AgentId::new(2),
                state_id: AgentId::new(1),
            })
        );
        assert!(set.is_empty());
    }

    #[test]
    fn merge_overwrites_and_keeps_absent_keys() {
        let mut target = two_agent_set();
        let mut incoming = KnowledgeSet::new();
        incoming.add(AgentId::new(2), state(2, "newer", "")).unwrap();
        incoming.add(AgentId::new(3), state(3, "third", "")).unwrap();

        target.merge_from(&incoming);

        assert_eq!(target.len(), 3);
        assert_eq!(target.get(AgentId::new(1)).unwrap().perception_context, "Perception Context");
        assert_eq!(target.get(AgentId::new(2)).unwrap().perception_context, "newer");
        assert!(target.contains(AgentId::new(3)));
    }

    #[test]
    fn merge_order_decides_conflicts() {
        let mut a = KnowledgeSet::new();
        a.add(AgentId::new(5), state(5, "from a", "")).unwrap();
        let mut b = KnowledgeSet::new();
        b.add(AgentId::new(5), state(5, "from b", "")).unwrap();

        let mut target = KnowledgeSet::new();
        target.merge_from(&a);
        target.merge_from(&b);
        assert_eq!(target.get(AgentId::new(5)).unwrap().perception_context, "from b");
    }

    #[test]
    fn copy_replaces_everything() {
        let mut target = KnowledgeSet::new();
        target.add(AgentId::new(9), state(9, "stale", "")).unwrap();
        target.copy_from(&two_agent_set());
        assert_eq!(target, two_agent_set());
        assert!(!target.contains(AgentId::new(9)));
    }

    #[test]
    fn summarize_leads_with_own_perception() {
        let set = two_agent_set();
        let digest = set.summarize(AgentId::new(2));
        let lines: Vec<&str> = digest.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Perception Context 2",
                "peer 1 has observed that Perception Context.",
                "peer 1 has planned the following response: Inference Result",
                "peer 2 has observed that Perception Context 2.",
                "peer 2 has planned the following response: Inference Result 2",
            ]
        );
    }

    #[test]
    fn summarize_skips_empty_inference_results() {
        let set: KnowledgeSet = [state(4, "Smoke to the north.", "")].into_iter().collect();
        assert_eq!(
            set.summarize(AgentId::new(1)),
            "peer 4 has observed that Smoke to the north."
        );
        assert_eq!(KnowledgeSet::new().summarize(AgentId::new(1)), "");
    }

    #[test]
    fn summarize_reports_peers_with_nothing_observed() {
        let set: KnowledgeSet = [state(3, "", "up")].into_iter().collect();
        assert_eq!(
            set.summarize(AgentId::new(3)),
            "peer 3 has observed nothing new.\npeer 3 has planned the following response: up"
        );
    }

    #[test]
    fn encode_decode_encode_is_stable() {
        let set = two_agent_set();
        let first = set.encode().unwrap();
        let decoded = KnowledgeSet::decode(&first).unwrap();
        assert_eq!(decoded, set);
        assert_eq!(decoded.encode().unwrap(), first);
    }

    #[test]
    fn wire_format_is_keyed_by_decimal_id() {
        let set: KnowledgeSet = [state(12, "seen", "go up")].into_iter().collect();
        let value: serde_json::Value = serde_json::from_str(&set.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "12": {
                    "id": 12,
                    "position": {"x": 1, "y": 1},
                    "perceptionContext": "seen",
                    "inferenceResult": "go up"
                }
            })
        );
    }

    #[test]
    fn decode_rejects_malformed_payloads() {
        let cases = [
            "not json",
            r#"{"1": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": ""}}"#,
            r#"{"1": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "", "inferenceResult": "", "extra": 1}}"#,
            r#"{"one": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "", "inferenceResult": ""}}"#,
            r#"{"2": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "", "inferenceResult": ""}}"#,
            r#"{"1": {"id": 1, "position": {"x": 0}, "perceptionContext": "", "inferenceResult": ""}}"#,
            "[1, 2]",
        ];
        for payload in cases {
            assert!(
                matches!(
                    KnowledgeSet::decode(payload),
                    Err(AgentError::Deserialization { .. })
                ),
                "payload should be rejected: {payload}"
            );
        }
    }

    #[test]
    fn decode_rejects_repeated_agent() {
        let payload = concat!(
            r#"{"1": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "A", "inferenceResult": ""},"#,
            r#" "1": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "B", "inferenceResult": ""}}"#,
        );
        let err = KnowledgeSet::decode(payload).unwrap_err();
        assert!(matches!(err, AgentError::Deserialization { ref reason } if reason.contains("more than once")));

        // "01" and "1" name the same agent.
        let payload = concat!(
            r#"{"1": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "A", "inferenceResult": ""},"#,
            r#" "01": {"id": 1, "position": {"x": 0, "y": 0}, "perceptionContext": "B", "inferenceResult": ""}}"#,
        );
        assert!(matches!(
            KnowledgeSet::decode(payload),
            Err(AgentError::Deserialization { .. })
        ));
    }
}
