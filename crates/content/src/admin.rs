//! Operator commands: liveness checks, snapshots, shutdown, and runtime
//! capability grants.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, CommandDef, EngineError, EntityId, Event, Result,
    Zone, capability_record, revive_from_record,
};

use crate::positioned::title_of;
use crate::util;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Admin {}

impl Capability for Admin {
    capability_record!(Admin, "Admin");
}

impl CapabilityKind for Admin {
    const NAME: &'static str = "Admin";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: revive_from_record::<Admin>,
            tick: None,
            commands: vec![
                CommandDef {
                    name: "ping",
                    pattern: r"^ping$",
                    handler: ping,
                },
                CommandDef {
                    name: "snapshot",
                    pattern: r"^snapshot$",
                    handler: snapshot,
                },
                CommandDef {
                    name: "halt",
                    pattern: r"^halt$",
                    handler: halt,
                },
                CommandDef {
                    name: "crash",
                    pattern: r"^crash$",
                    handler: crash,
                },
                CommandDef {
                    name: "grant",
                    pattern: r"^grant (?P<descriptor>.+?) (?P<capability>\S+)$",
                    handler: grant,
                },
                CommandDef {
                    name: "revoke",
                    pattern: r"^revoke (?P<descriptor>.+?) (?P<capability>\S+)$",
                    handler: revoke,
                },
            ],
            hooks: Vec::new(),
        }
    }
}

fn require_admin(zone: &mut Zone, actor: EntityId) -> bool {
    if zone.has::<Admin>(actor) {
        true
    } else {
        zone.tell(actor, "You're unable to do that.");
        false
    }
}

pub fn ping(zone: &mut Zone, event: &mut Event) -> Result<()> {
    if require_admin(zone, event.actor) {
        zone.tell(event.actor, "Pong!");
    }
    Ok(())
}

pub fn snapshot(zone: &mut Zone, event: &mut Event) -> Result<()> {
    if require_admin(zone, event.actor) {
        zone.tell(event.actor, "Saving snapshot.");
        zone.request_snapshot();
    }
    Ok(())
}

pub fn halt(zone: &mut Zone, event: &mut Event) -> Result<()> {
    if require_admin(zone, event.actor) {
        zone.tell(event.actor, "Shutting down.");
        zone.stop();
    }
    Ok(())
}

/// Deliberately fails, exercising the crash-recovery path end to end.
pub fn crash(zone: &mut Zone, event: &mut Event) -> Result<()> {
    if !require_admin(zone, event.actor) {
        return Ok(());
    }
    Err(EngineError::Content("Craaaaash".to_string()))
}

pub fn grant(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_admin(zone, actor) {
        return Ok(());
    }
    let descriptor = event.capture("descriptor").unwrap_or("").to_string();
    let capability = event.capture("capability").unwrap_or("").to_string();

    let matches = util::resolve_global(zone, &descriptor);
    let Some(&target) = matches.first() else {
        zone.tell(actor, format!("No such entity '{descriptor}'."));
        return Ok(());
    };

    let registry = Arc::clone(zone.registry());
    if registry.lookup(&capability).is_none() {
        zone.tell(actor, format!("No such capability '{capability}'."));
        return Ok(());
    }
    // Fresh instance with default state.
    match registry.revive(&capability, json!({})) {
        Ok(instance) => {
            zone.attach(target, instance);
            let title = title_of(zone, target);
            zone.tell(actor, format!("Granted {capability} to {title}."));
        }
        Err(err) => {
            zone.tell(actor, format!("Couldn't grant {capability}: {err}"));
        }
    }
    Ok(())
}

pub fn revoke(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_admin(zone, actor) {
        return Ok(());
    }
    let descriptor = event.capture("descriptor").unwrap_or("").to_string();
    let capability = event.capture("capability").unwrap_or("").to_string();

    let matches = util::resolve_global(zone, &descriptor);
    let Some(&target) = matches.first() else {
        zone.tell(actor, format!("No such entity '{descriptor}'."));
        return Ok(());
    };

    let title = title_of(zone, target);
    if zone.has_named(target, &capability) {
        zone.detach(target, &capability);
        zone.tell(actor, format!("Revoked {capability} from {title}."));
    } else {
        zone.tell(actor, format!("{title} doesn't have {capability}."));
    }
    Ok(())
}
