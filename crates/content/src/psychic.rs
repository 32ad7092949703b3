//! Repeats whatever is said nearby.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Event, HookDef, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::{self, Positioned};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Psychic {}

impl Capability for Psychic {
    capability_record!(Psychic, "Psychic");
}

impl CapabilityKind for Psychic {
    const NAME: &'static str = "Psychic";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Psychic>,
            tick: None,
            commands: Vec::new(),
            hooks: vec![HookDef {
                point: HookPoint::After,
                target: positioned::say,
                hook: repeat_speech,
            }],
        }
    }
}

fn repeat_speech(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    // Psychics don't repeat each other; that would never terminate.
    if witness == event.actor || zone.has::<Psychic>(event.actor) {
        return Ok(());
    }
    if !zone.has::<Positioned>(witness) {
        return Ok(());
    }
    let message = event.capture("message").unwrap_or("").to_string();
    let captures = BTreeMap::from([("message".to_string(), message)]);
    zone.invoke(witness, "say", captures)
}
