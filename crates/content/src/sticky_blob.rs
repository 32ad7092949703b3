//! A difficult-to-drop item.

use rand::Rng;
use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Event, HookDef, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::{self, name_of};

fn default_stickiness() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyBlob {
    /// Probability in [0, 1] that a drop attempt fails.
    #[serde(default = "default_stickiness")]
    pub stickiness: f64,
}

impl StickyBlob {
    pub fn new(stickiness: f64) -> Self {
        Self { stickiness }
    }
}

impl Default for StickyBlob {
    fn default() -> Self {
        Self {
            stickiness: default_stickiness(),
        }
    }
}

impl Capability for StickyBlob {
    capability_record!(StickyBlob, "StickyBlob");
}

impl CapabilityKind for StickyBlob {
    const NAME: &'static str = "StickyBlob";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<StickyBlob>,
            tick: None,
            commands: Vec::new(),
            hooks: vec![HookDef {
                point: HookPoint::Before,
                target: positioned::drop_item,
                hook: stick,
            }],
        }
    }
}

fn stick(zone: &mut Zone, witness: EntityId, event: &mut Event) -> Result<()> {
    if event.target != Some(witness) {
        return Ok(());
    }
    let Some(stickiness) = zone.get::<StickyBlob>(witness).map(|b| b.stickiness) else {
        return Ok(());
    };
    if zone.rng_mut().r#gen::<f64>() < stickiness {
        let name = name_of(zone, witness);
        zone.tell(
            event.actor,
            format!("You try to drop {name}, but it sticks to your hand."),
        );
        event.prevent();
    }
    Ok(())
}
