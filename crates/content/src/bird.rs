//! Ambient fauna: occasionally hops, squawks, preens, or pecks.

use rand::Rng;
use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, EntityId, Result, Zone, capability_record,
    revive_from_record,
};

use crate::positioned::{Positioned, title_of};

const ANTICS: &[(&str, &str)] = &[
    ("hop around", "hops around"),
    ("squawk", "squawks"),
    ("preen", "preens"),
    ("peck at the ground", "pecks at the ground"),
];

fn default_noisiness() -> f64 {
    0.05
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    /// Per-tick probability of doing something noticeable.
    #[serde(default = "default_noisiness")]
    pub noisiness: f64,
}

impl Bird {
    pub fn new(noisiness: f64) -> Self {
        Self { noisiness }
    }
}

impl Default for Bird {
    fn default() -> Self {
        Self {
            noisiness: default_noisiness(),
        }
    }
}

impl Capability for Bird {
    capability_record!(Bird, "Bird");
}

impl CapabilityKind for Bird {
    const NAME: &'static str = "Bird";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Bird>,
            tick: Some(tick),
            commands: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

fn tick(zone: &mut Zone, owner: EntityId) -> Result<()> {
    let Some(noisiness) = zone.get::<Bird>(owner).map(|b| b.noisiness) else {
        return Ok(());
    };
    if zone.rng_mut().r#gen::<f64>() >= noisiness {
        return Ok(());
    }
    let (second_verb, third_verb) = ANTICS[zone.rng_mut().gen_range(0..ANTICS.len())];
    zone.tell(owner, format!("You {second_verb}."));
    if zone.has::<Positioned>(owner) {
        let title = title_of(zone, owner);
        Positioned::emit(zone, owner, &format!("{title} {third_verb}."), &[]);
    }
    Ok(())
}
