//! An unlit container: anyone inside sees nothing when they look around.

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Event, HookDef, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::{self, Positioned};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dark {}

impl Capability for Dark {
    capability_record!(Dark, "Dark");
}

impl CapabilityKind for Dark {
    const NAME: &'static str = "Dark";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Dark>,
            tick: None,
            commands: Vec::new(),
            hooks: vec![HookDef {
                point: HookPoint::Before,
                target: positioned::look,
                hook: see_nothing,
            }],
        }
    }
}

fn see_nothing(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if Positioned::contents_of(zone, witness).contains(&event.actor) {
        zone.tell(event.actor, "It's too dark to see anything here.");
        event.prevent();
    }
    Ok(())
}
