//! Absorbs light: paint applied to it comes out black, and it can't be
//! looked at directly.

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Event, HookDef, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::{self, name_of};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlackHole {}

impl Capability for BlackHole {
    capability_record!(BlackHole, "BlackHole");
}

impl CapabilityKind for BlackHole {
    const NAME: &'static str = "BlackHole";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<BlackHole>,
            tick: None,
            commands: Vec::new(),
            hooks: vec![
                HookDef {
                    point: HookPoint::Before,
                    target: crate::colorful::paint,
                    hook: absorb_paint,
                },
                HookDef {
                    point: HookPoint::Before,
                    target: positioned::look_at,
                    hook: swallow_gaze,
                },
            ],
        }
    }
}

fn absorb_paint(_zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if event.target == Some(witness) {
        event.set_capture("color", "black");
    }
    Ok(())
}

fn swallow_gaze(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if event.target == Some(witness) {
        let name = name_of(zone, witness);
        zone.tell(
            event.actor,
            format!("You're unable to look directly at {name}."),
        );
        event.prevent();
    }
    Ok(())
}
