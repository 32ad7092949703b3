//! Occasionally walks through an exit toward one of its allowed
//! destinations.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Result, Zone, capability_record,
    revive_from_record,
};

use crate::positioned::Positioned;

fn default_wanderlust() -> f64 {
    0.01
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wandering {
    /// Per-tick probability of attempting to move.
    #[serde(default = "default_wanderlust")]
    pub wanderlust: f64,
    /// Containers this entity is willing to wander into.
    #[serde(default)]
    pub destinations: Vec<EntityId>,
}

impl Wandering {
    pub fn new(wanderlust: f64, destinations: Vec<EntityId>) -> Self {
        Self {
            wanderlust,
            destinations,
        }
    }
}

impl Default for Wandering {
    fn default() -> Self {
        Self {
            wanderlust: default_wanderlust(),
            destinations: Vec::new(),
        }
    }
}

impl Capability for Wandering {
    capability_record!(Wandering, "Wandering");
}

impl CapabilityKind for Wandering {
    const NAME: &'static str = "Wandering";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Wandering>,
            tick: Some(tick),
            commands: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

fn tick(zone: &mut Zone, owner: EntityId) -> Result<()> {
    let Some(wanderlust) = zone.get::<Wandering>(owner).map(|w| w.wanderlust) else {
        return Ok(());
    };
    if zone.rng_mut().r#gen::<f64>() >= wanderlust {
        return Ok(());
    }
    let Some(room) = Positioned::container_of(zone, owner) else {
        return Ok(());
    };
    let destinations = zone
        .get::<Wandering>(owner)
        .map(|w| w.destinations.clone())
        .unwrap_or_default();
    let valid_exits: Vec<String> = Positioned::exits_of(zone, room)
        .into_iter()
        .filter(|(_, to)| destinations.contains(to))
        .map(|(direction, _)| direction)
        .collect();
    if valid_exits.is_empty() {
        return Ok(());
    }
    let direction = valid_exits[zone.rng_mut().gen_range(0..valid_exits.len())].clone();
    tracing::debug!(%owner, %direction, "wandering");
    let captures = BTreeMap::from([("direction".to_string(), direction)]);
    zone.invoke(owner, "walk", captures)
}
