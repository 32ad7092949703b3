//! A paintable surface: entities with a color that can be read and changed.

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, CommandDef, Event, HookPoint, Result, Zone,
    capability_record, revive_from_record,
};

use crate::positioned::title_of;
use crate::util;

fn default_color() -> String {
    "blue".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colorful {
    #[serde(default = "default_color")]
    pub color: String,
}

impl Colorful {
    pub fn new(color: impl Into<String>) -> Self {
        Self { color: color.into() }
    }
}

impl Default for Colorful {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

impl Capability for Colorful {
    capability_record!(Colorful, "Colorful");
}

impl CapabilityKind for Colorful {
    const NAME: &'static str = "Colorful";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Colorful>,
            tick: None,
            commands: vec![
                CommandDef {
                    name: "color of",
                    pattern: r"^color(?: of)? (?P<descriptor>.+)$",
                    handler: color_of,
                },
                CommandDef {
                    name: "paint",
                    pattern: r"^paint (?P<descriptor>.+?) (?P<color>\S+)$",
                    handler: paint,
                },
            ],
            hooks: Vec::new(),
        }
    }
}

fn resolve(zone: &mut Zone, event: &Event) -> Option<mudlark_engine::EntityId> {
    let descriptor = event.capture("descriptor").unwrap_or("").to_string();
    let matches = util::resolve_global(zone, &descriptor);
    if matches.is_empty() {
        zone.tell(event.actor, format!("No such entity '{descriptor}'."));
        return None;
    }
    Some(matches[0])
}

pub fn color_of(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    let Some(target) = resolve(zone, event) else {
        return Ok(());
    };
    event.target = Some(target);

    let title = title_of(zone, target);
    match zone.get::<Colorful>(target) {
        Some(colorful) => {
            let line = format!("{title} is {}.", colorful.color);
            zone.tell(actor, line);
        }
        None => zone.tell(actor, format!("{title} has no particular color.")),
    }
    Ok(())
}

pub fn paint(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    let Some(target) = resolve(zone, event) else {
        return Ok(());
    };
    event.target = Some(target);

    if !zone.has::<Colorful>(target) {
        let title = title_of(zone, target);
        zone.tell(actor, format!("{title} cannot be painted."));
        return Ok(());
    }

    let witnesses = [target];
    zone.run_hooks(HookPoint::Before, paint, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    // A hook may have overridden the requested color.
    let color = event.capture("color").unwrap_or("").to_string();
    if let Some(colorful) = zone.get_mut::<Colorful>(target) {
        colorful.color = color.clone();
    }
    let title = title_of(zone, target);
    zone.tell(actor, format!("{title} is now {color}."));

    zone.run_hooks(HookPoint::After, paint, &witnesses, event)
}
