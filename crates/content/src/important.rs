//! An item that refuses to be taken, dropped, or stashed.

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Event, HookDef, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::{self, title_of};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Important {}

impl Capability for Important {
    capability_record!(Important, "Important");
}

impl CapabilityKind for Important {
    const NAME: &'static str = "Important";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Important>,
            tick: None,
            commands: Vec::new(),
            hooks: vec![
                HookDef {
                    point: HookPoint::Before,
                    target: positioned::drop_item,
                    hook: prevent_discard,
                },
                HookDef {
                    point: HookPoint::Before,
                    target: positioned::put_in,
                    hook: prevent_discard,
                },
                HookDef {
                    point: HookPoint::Before,
                    target: positioned::take,
                    hook: prevent_grab,
                },
                HookDef {
                    point: HookPoint::Before,
                    target: positioned::take_from,
                    hook: prevent_grab,
                },
            ],
        }
    }
}

fn prevent_discard(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if event.target == Some(witness) {
        zone.tell(
            event.actor,
            "You shouldn't get rid of this; it's very important.",
        );
        event.prevent();
    }
    Ok(())
}

fn prevent_grab(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if event.target == Some(witness) {
        let title = title_of(zone, witness);
        zone.tell(event.actor, format!("{title} resists your attempt to grab it."));
        event.prevent();
    }
    Ok(())
}
