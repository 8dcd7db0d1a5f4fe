//! Scenario catalog and hotspot placement.
//!
//! Hotspots come from `scenario.hotspots` in the config. An entry names a
//! catalog kind and optionally overrides the description and the cell.
//! Entries with an explicit cell are placed first, then the rest are
//! scattered over distinct free cells with the run's seeded RNG.

use rand::Rng;
use swarm_types::GridDimensions;
use swarm_world::{HotspotMap, WorldError};
use tracing::info;

use crate::config::HotspotConfig;

/// Built-in scenario descriptions, keyed by kind.
pub const CATALOG: &[(&str, &str)] = &[
    (
        "hurricane",
        "A massive hurricane is swirling violently within this region, with dark clouds and high winds causing widespread damage.",
    ),
    (
        "damaged_road_bridge",
        "A main road or bridge has been severely damaged, with large cracks and debris obstructing passage.",
    ),
    (
        "trapped_person",
        "A person has been located, trapped under rubble or stranded in an isolated area, visibly distressed and in need of rescue.",
    ),
    (
        "forest_fire",
        "A raging forest fire is consuming large areas of vegetation, with thick smoke billowing into the sky.",
    ),
    (
        "distress_signals",
        "SOS signals, lights, or sounds are detected, indicating people in distress and urgently needing assistance.",
    ),
    (
        "flooded_streets",
        "Streets are submerged in water, with vehicles partially submerged and residents seeking higher ground.",
    ),
    (
        "collapsed_buildings",
        "Multiple buildings have collapsed, with rubble and debris scattered across the area.",
    ),
    (
        "landslide",
        "A landslide has occurred, with large amounts of earth and rock sliding down a hillside, burying structures and blocking roads.",
    ),
    (
        "tornado",
        "A tornado has touched down, creating a path of destruction with uprooted trees and damaged buildings.",
    ),
    (
        "emergency_vehicles",
        "Emergency vehicles such as ambulances, fire trucks, and police cars are present, with sirens blaring and personnel assisting survivors.",
    ),
    (
        "evacuation",
        "Evacuation efforts are underway, with crowds of people moving towards designated safe zones, guided by emergency responders.",
    ),
    (
        "rescue_helicopter",
        "A rescue helicopter is hovering overhead, lowering a harness to lift stranded individuals to safety.",
    ),
    (
        "temporary_shelters",
        "Temporary shelters have been set up, with people gathering to receive food, water, and medical aid.",
    ),
    (
        "communication_towers_down",
        "Communication towers are down, with wires and equipment scattered, causing disruptions in communication networks.",
    ),
    (
        "debris_blocking_roads",
        "Debris, including fallen trees and overturned vehicles, is blocking major roads, hindering movement and access for rescue teams.",
    ),
];

/// Catalog text for `kind`.
pub fn describe(kind: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(key, _)| *key == kind)
        .map(|(_, text)| *text)
}

/// Errors from building the hotspot map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    /// A hotspot has neither a description nor a catalog entry.
    #[error("hotspot kind `{kind}` has no description")]
    UnknownKind {
        /// The configured kind.
        kind: String,
    },

    /// Placement failed.
    #[error("hotspot placement failed: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Place the configured hotspots on a map of `dimensions`.
///
/// # Errors
///
/// Returns [`ScenarioError::UnknownKind`] for an entry without text and
/// [`ScenarioError::World`] for out-of-bounds, duplicate, or unplaceable
/// entries.
pub fn build_hotspots<R: Rng>(
    hotspots: &[HotspotConfig],
    dimensions: GridDimensions,
    rng: &mut R,
) -> Result<HotspotMap, ScenarioError> {
    let mut map = HotspotMap::new(dimensions);
    let text_of = |hotspot: &HotspotConfig| {
        hotspot
            .text()
            .map(ToOwned::to_owned)
            .ok_or_else(|| ScenarioError::UnknownKind {
                kind: hotspot.kind.clone(),
            })
    };

    for hotspot in hotspots {
        if let Some(position) = hotspot.position {
            map.insert(position, text_of(hotspot)?)?;
            info!(kind = %hotspot.kind, %position, "hotspot placed");
        }
    }
    for hotspot in hotspots.iter().filter(|h| h.position.is_none()) {
        let position = map.insert_random(text_of(hotspot)?, rng)?;
        info!(kind = %hotspot.kind, %position, "hotspot placed at random");
    }
    Ok(map)
}
