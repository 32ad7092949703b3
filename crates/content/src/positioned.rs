//! Spatial containment, movement, manipulation, and target selection.
//!
//! `Positioned` gives an entity a place in the containment tree: an optional
//! container, a set of contents, and named exits to other containers. It
//! carries the bulk of the stock command set; other capabilities hook its
//! handlers to observe or veto them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use mudlark_engine::{
    Capability, CapabilityDef, CapabilityKind, CommandDef, DisambiguateState, EntityId, Event,
    HookPoint, Mode, Result, Zone, capability_record,
};

use crate::util;

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Positioned {
    #[serde(default)]
    pub container_id: Option<EntityId>,
    #[serde(default)]
    pub is_container: bool,
    #[serde(default)]
    pub is_carriable: bool,
    #[serde(default)]
    pub is_enterable: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    contents: BTreeSet<EntityId>,
    #[serde(default)]
    exits: BTreeMap<String, EntityId>,
}

impl Default for Positioned {
    fn default() -> Self {
        Self {
            container_id: None,
            is_container: false,
            is_carriable: false,
            is_enterable: false,
            is_visible: true,
            contents: BTreeSet::new(),
            exits: BTreeMap::new(),
        }
    }
}

impl Positioned {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self) -> Self {
        self.is_container = true;
        self
    }

    pub fn carriable(mut self) -> Self {
        self.is_carriable = true;
        self
    }

    pub fn enterable(mut self) -> Self {
        self.is_enterable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    /// Starts the entity inside the given container when attached.
    pub fn inside(mut self, container: EntityId) -> Self {
        self.container_id = Some(container);
        self
    }

    // ------------------------------------------------------------------
    // Topology queries
    // ------------------------------------------------------------------

    pub fn container_of(zone: &Zone, id: EntityId) -> Option<EntityId> {
        zone.get::<Positioned>(id)?.container_id
    }

    /// Direct contents, in id order.
    pub fn contents_of(zone: &Zone, id: EntityId) -> Vec<EntityId> {
        zone.get::<Positioned>(id)
            .map(|p| p.contents.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn exits_of(zone: &Zone, id: EntityId) -> Vec<(String, EntityId)> {
        zone.get::<Positioned>(id)
            .map(|p| p.exits.iter().map(|(d, &to)| (d.clone(), to)).collect())
            .unwrap_or_default()
    }

    /// Siblings: the other contents of this entity's container.
    pub fn nearby(zone: &Zone, id: EntityId) -> Vec<EntityId> {
        let Some(container) = Self::container_of(zone, id) else {
            return Vec::new();
        };
        Self::contents_of(zone, container)
            .into_iter()
            .filter(|&other| other != id)
            .collect()
    }

    /// The default witness set for an actor's commands: its container, its
    /// siblings, and its own contents.
    pub fn witnesses(zone: &Zone, actor: EntityId) -> Vec<EntityId> {
        let mut witnesses = Vec::new();
        if let Some(container) = Self::container_of(zone, actor) {
            witnesses.push(container);
        }
        for id in Self::nearby(zone, actor) {
            if !witnesses.contains(&id) {
                witnesses.push(id);
            }
        }
        for id in Self::contents_of(zone, actor) {
            if !witnesses.contains(&id) {
                witnesses.push(id);
            }
        }
        witnesses
    }

    fn is_container(zone: &Zone, id: EntityId) -> bool {
        zone.get::<Positioned>(id).is_some_and(|p| p.is_container)
    }

    // ------------------------------------------------------------------
    // Topology mutation
    // ------------------------------------------------------------------

    /// Moves an entity into a container, unlinking it from its old one.
    pub fn move_to(zone: &mut Zone, entity: EntityId, container: EntityId) {
        if let Some(old) = Self::container_of(zone, entity)
            && let Some(p) = zone.get_mut::<Positioned>(old)
        {
            p.contents.remove(&entity);
        }
        if let Some(p) = zone.get_mut::<Positioned>(container) {
            p.contents.insert(entity);
        }
        if let Some(p) = zone.get_mut::<Positioned>(entity) {
            p.container_id = Some(container);
        }
    }

    /// Adds an exit from one container to another, optionally with a return
    /// exit in the other direction.
    pub fn link(zone: &mut Zone, from: EntityId, direction: &str, to: EntityId, back: Option<&str>) {
        if let Some(p) = zone.get_mut::<Positioned>(from) {
            p.exits.insert(direction.to_string(), to);
        }
        if let Some(back) = back
            && let Some(p) = zone.get_mut::<Positioned>(to)
        {
            p.exits.insert(back.to_string(), from);
        }
    }

    // ------------------------------------------------------------------
    // Communication
    // ------------------------------------------------------------------

    /// Tells every sibling of `from` except the excluded ones.
    pub fn emit(zone: &mut Zone, from: EntityId, text: &str, exclude: &[EntityId]) {
        for listener in Self::nearby(zone, from) {
            if !exclude.contains(&listener) {
                zone.tell(listener, text);
            }
        }
    }

    /// Tells every direct content of a container.
    pub fn announce(zone: &mut Zone, container: EntityId, text: &str) {
        for listener in Self::contents_of(zone, container) {
            zone.tell(listener, text);
        }
    }

    fn tell_surroundings(zone: &mut Zone, actor: EntityId) {
        let Some(room) = Self::container_of(zone, actor) else {
            return;
        };
        let Some(entity) = zone.entity(room) else {
            return;
        };
        let mut lines = vec![util::capwords(&entity.name), entity.desc.clone()];

        let exits = Self::exits_of(zone, room);
        if !exits.is_empty() {
            lines.push("Exits:".to_string());
            for (direction, destination) in exits {
                let name = name_of(zone, destination);
                lines.push(util::indent(&format!("{direction}: {name}")));
            }
        }

        let visible_nearby: Vec<_> = Self::nearby(zone, actor)
            .into_iter()
            .filter(|&id| zone.get::<Positioned>(id).is_some_and(|p| p.is_visible))
            .collect();
        if !visible_nearby.is_empty() {
            lines.push("Things nearby:".to_string());
            for id in visible_nearby {
                lines.push(util::indent(&name_of(zone, id)));
            }
        }

        zone.tell(actor, lines.join("\n"));
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Entities from the pool matching a descriptor: "self"/"me"/"myself",
    /// an exact id, or a case-insensitive name substring. Only visible
    /// entities match.
    pub fn pick(zone: &Zone, actor: EntityId, descriptor: &str, pool: &[EntityId]) -> Vec<EntityId> {
        let lowered = descriptor.to_lowercase();
        if matches!(lowered.as_str(), "self" | "me" | "myself") {
            return vec![actor];
        }
        let by_id = descriptor.parse::<u64>().ok().map(EntityId);
        pool.iter()
            .copied()
            .filter(|&id| {
                let Some(entity) = zone.entity(id) else {
                    return false;
                };
                let visible = zone.get::<Positioned>(id).is_some_and(|p| p.is_visible);
                visible && (entity.name.to_lowercase().contains(&lowered) || Some(id) == by_id)
            })
            .collect()
    }

    /// Resolves one capture slot against a pool. Zero matches tells the
    /// actor and returns `None`; multiple matches presents a numbered menu,
    /// switches the actor into disambiguation mode with the current command
    /// and captures pending, and returns `None`.
    fn pick_interactively(
        zone: &mut Zone,
        event: &Event,
        slot: &str,
        pool: &[EntityId],
        area: &str,
    ) -> Option<EntityId> {
        let actor = event.actor;
        let descriptor = event.capture(slot).unwrap_or("").to_string();
        let matches = Self::pick(zone, actor, &descriptor, pool);
        match matches.len() {
            0 => {
                zone.tell(actor, format!("There's no {descriptor} {area}."));
                None
            }
            1 => Some(matches[0]),
            _ => {
                zone.tell(actor, format!("Which '{descriptor}' do you mean?"));
                for (index, &id) in matches.iter().enumerate() {
                    let position = if Self::container_of(zone, id) == Some(actor) {
                        "in inventory"
                    } else {
                        "nearby"
                    };
                    let name = name_of(zone, id);
                    let line = format!("{}. {} ({})", index + 1, name, position);
                    zone.tell(actor, util::indent(&line));
                }
                if let Some(entity) = zone.entity_mut(actor) {
                    let previous = entity.mode.take().unwrap_or(Mode::Action);
                    entity.mode = Some(Mode::Disambiguate(DisambiguateState {
                        previous: Box::new(previous),
                        command: event.command.to_string(),
                        captures: event.captures.clone(),
                        slot: slot.to_string(),
                        candidates: matches,
                    }));
                }
                None
            }
        }
    }

    fn pick_nearby(zone: &mut Zone, event: &Event, slot: &str) -> Option<EntityId> {
        let pool = Self::nearby(zone, event.actor);
        Self::pick_interactively(zone, event, slot, &pool, "nearby")
    }

    fn pick_inventory(zone: &mut Zone, event: &Event, slot: &str) -> Option<EntityId> {
        let pool = Self::contents_of(zone, event.actor);
        Self::pick_interactively(zone, event, slot, &pool, "in your inventory")
    }

    fn pick_from(
        zone: &mut Zone,
        event: &Event,
        slot: &str,
        container: EntityId,
    ) -> Option<EntityId> {
        let pool = Self::contents_of(zone, container);
        let area = format!("in {}", name_of(zone, container));
        Self::pick_interactively(zone, event, slot, &pool, &area)
    }

    fn pick_nearby_inventory(zone: &mut Zone, event: &Event, slot: &str) -> Option<EntityId> {
        let mut pool = Self::contents_of(zone, event.actor);
        for id in Self::nearby(zone, event.actor) {
            if !pool.contains(&id) {
                pool.push(id);
            }
        }
        Self::pick_interactively(zone, event, slot, &pool, "nearby")
    }
}

impl Capability for Positioned {
    capability_record!(Positioned, "Positioned");

    fn on_attach(&mut self, zone: &mut Zone, owner: EntityId) {
        if let Some(container) = self.container_id
            && let Some(p) = zone.get_mut::<Positioned>(container)
        {
            p.contents.insert(owner);
        }
    }

    fn on_detach(&mut self, zone: &mut Zone, owner: EntityId) {
        // Re-parent contents to this entity's own container.
        for item in std::mem::take(&mut self.contents) {
            if let Some(p) = zone.get_mut::<Positioned>(item) {
                p.container_id = self.container_id;
            }
            if let Some(container) = self.container_id
                && let Some(p) = zone.get_mut::<Positioned>(container)
            {
                p.contents.insert(item);
            }
        }
        if let Some(container) = self.container_id
            && let Some(p) = zone.get_mut::<Positioned>(container)
        {
            p.contents.remove(&owner);
        }
        self.exits.clear();
    }
}

impl CapabilityKind for Positioned {
    const NAME: &'static str = "Positioned";

    fn definition() -> CapabilityDef {
        CapabilityDef {
            name: Self::NAME,
            revive: mudlark_engine::revive_from_record::<Positioned>,
            tick: None,
            commands: vec![
                CommandDef {
                    name: "say",
                    pattern: r"^s(?:ay)? (?P<message>.+)$",
                    handler: say,
                },
                CommandDef {
                    name: "look",
                    pattern: r"^l(?:ook)?(?: around)?$",
                    handler: look,
                },
                CommandDef {
                    name: "look in",
                    pattern: r"^l(?:ook)? (?:in(?:to|side(?: of)?)?) (?P<descriptor>.+)$",
                    handler: look_in,
                },
                CommandDef {
                    name: "look at",
                    pattern: r"^(?:ex(?:amine)?|l(?:ook)?) (?:at )?(?P<descriptor>.+)$",
                    handler: look_at,
                },
                CommandDef {
                    name: "take",
                    pattern: r"^(?:get|take|pick up) (?P<descriptor>.+)$",
                    handler: take,
                },
                CommandDef {
                    name: "take from",
                    pattern:
                        r"^(?:get|take|pick up) (?P<target_descriptor>.+) from (?P<container_descriptor>.+)$",
                    handler: take_from,
                },
                CommandDef {
                    name: "put in",
                    pattern:
                        r"^put (?P<target_descriptor>.+) (?:in(?:to|side(?: of)?)?) (?P<container_descriptor>.+)$",
                    handler: put_in,
                },
                CommandDef {
                    name: "drop",
                    pattern: r"^drop (?P<descriptor>.+)$",
                    handler: drop_item,
                },
                CommandDef {
                    name: "walk",
                    pattern: r"^(?:w(?:alk)?|go) (?P<direction>.+)$",
                    handler: walk,
                },
                CommandDef {
                    name: "enter",
                    pattern: r"^enter (?P<descriptor>.+)$",
                    handler: enter,
                },
                CommandDef {
                    name: "inventory",
                    pattern: r"^(?:i|inv|inventory)$",
                    handler: inventory,
                },
                CommandDef {
                    name: "north",
                    pattern: r"^n(?:orth)?$",
                    handler: go_north,
                },
                CommandDef {
                    name: "south",
                    pattern: r"^s(?:outh)?$",
                    handler: go_south,
                },
                CommandDef {
                    name: "east",
                    pattern: r"^e(?:ast)?$",
                    handler: go_east,
                },
                CommandDef {
                    name: "west",
                    pattern: r"^w(?:est)?$",
                    handler: go_west,
                },
                CommandDef {
                    name: "northeast",
                    pattern: r"^(?:ne|northeast)$",
                    handler: go_northeast,
                },
                CommandDef {
                    name: "northwest",
                    pattern: r"^(?:nw|northwest)$",
                    handler: go_northwest,
                },
                CommandDef {
                    name: "southeast",
                    pattern: r"^(?:se|southeast)$",
                    handler: go_southeast,
                },
                CommandDef {
                    name: "southwest",
                    pattern: r"^(?:sw|southwest)$",
                    handler: go_southwest,
                },
                CommandDef {
                    name: "up",
                    pattern: r"^u(?:p)?$",
                    handler: go_up,
                },
                CommandDef {
                    name: "down",
                    pattern: r"^d(?:own)?$",
                    handler: go_down,
                },
            ],
            hooks: Vec::new(),
        }
    }
}

pub(crate) fn name_of(zone: &Zone, id: EntityId) -> String {
    zone.entity(id).map(|e| e.name.clone()).unwrap_or_default()
}

pub(crate) fn title_of(zone: &Zone, id: EntityId) -> String {
    zone.entity(id).map(|e| e.title()).unwrap_or_default()
}

fn require_positioned(zone: &mut Zone, actor: EntityId, refusal: &str) -> bool {
    if zone.has::<Positioned>(actor) {
        true
    } else {
        zone.tell(actor, refusal);
        false
    }
}

fn with_resolved(zone: &Zone, actor: EntityId, extra: &[Option<EntityId>]) -> Vec<EntityId> {
    let mut witnesses = Positioned::witnesses(zone, actor);
    for &id in extra.iter().flatten() {
        if !witnesses.contains(&id) {
            witnesses.push(id);
        }
    }
    witnesses
}

// ----------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------

pub fn say(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to do that.") {
        return Ok(());
    }
    let message = util::punctuate(event.capture("message").unwrap_or(""));
    event.set_capture("message", message);

    let witnesses = Positioned::nearby(zone, actor);
    zone.run_hooks(HookPoint::Before, say, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    // Hooks may have rewritten the message.
    let message = event.capture("message").unwrap_or("").to_string();
    let title = title_of(zone, actor);
    zone.tell(actor, format!("You say: \"{message}\""));
    Positioned::emit(zone, actor, &format!("{title} says: \"{message}\""), &[]);

    zone.run_hooks(HookPoint::After, say, &witnesses, event)
}

pub fn look(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to do that.") {
        return Ok(());
    }
    let witnesses = Positioned::witnesses(zone, actor);
    zone.run_hooks(HookPoint::Before, look, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    Positioned::emit(zone, actor, &format!("{title} looks around."), &[]);
    Positioned::tell_surroundings(zone, actor);

    zone.run_hooks(HookPoint::After, look, &witnesses, event)
}

pub fn look_in(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to do that.") {
        return Ok(());
    }
    let Some(target) = Positioned::pick_nearby_inventory(zone, event, "descriptor") else {
        return Ok(());
    };
    event.target = Some(target);

    if !Positioned::is_container(zone, target) {
        zone.tell(actor, "You can't look inside of that.");
        return Ok(());
    }

    let witnesses = with_resolved(zone, actor, &[event.target]);
    zone.run_hooks(HookPoint::Before, look_in, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    zone.tell(actor, "Contents:");
    let visible: Vec<_> = Positioned::contents_of(zone, target)
        .into_iter()
        .filter(|&id| zone.get::<Positioned>(id).is_some_and(|p| p.is_visible))
        .collect();
    if visible.is_empty() {
        zone.tell(actor, util::indent("nothing"));
    } else {
        for id in visible {
            let name = name_of(zone, id);
            zone.tell(actor, util::indent(&name));
        }
    }

    zone.run_hooks(HookPoint::After, look_in, &witnesses, event)
}

pub fn look_at(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to do that.") {
        return Ok(());
    }
    let Some(target) = Positioned::pick_nearby_inventory(zone, event, "descriptor") else {
        return Ok(());
    };
    event.target = Some(target);

    let witnesses = with_resolved(zone, actor, &[event.target]);
    zone.run_hooks(HookPoint::Before, look_at, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let desc = zone.entity(target).map(|e| e.desc.clone()).unwrap_or_default();
    let title = title_of(zone, actor);
    let target_name = name_of(zone, target);
    zone.tell(actor, desc);
    Positioned::emit(
        zone,
        actor,
        &format!("{title} looks at {target_name}."),
        &[target],
    );
    zone.tell(target, format!("{title} looks at you."));

    zone.run_hooks(HookPoint::After, look_at, &witnesses, event)
}

pub fn take(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !zone.get::<Positioned>(actor).is_some_and(|p| p.is_container) {
        zone.tell(actor, "You're unable to do that.");
        return Ok(());
    }
    let Some(target) = Positioned::pick_nearby(zone, event, "descriptor") else {
        return Ok(());
    };
    event.target = Some(target);

    if target == actor {
        zone.tell(actor, "You can't put yourself in your inventory.");
        return Ok(());
    }
    if !zone.get::<Positioned>(target).is_some_and(|p| p.is_carriable) {
        zone.tell(actor, "That can't be carried.");
        return Ok(());
    }

    let witnesses = with_resolved(zone, actor, &[event.target]);
    zone.run_hooks(HookPoint::Before, take, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    let target_name = name_of(zone, target);
    zone.tell(actor, format!("You pick up {target_name}."));
    Positioned::emit(
        zone,
        actor,
        &format!("{title} picks up {target_name}."),
        &[target],
    );
    zone.tell(target, format!("{title} picks you up."));
    Positioned::move_to(zone, target, actor);

    zone.run_hooks(HookPoint::After, take, &witnesses, event)
}

pub fn take_from(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !zone.get::<Positioned>(actor).is_some_and(|p| p.is_container) {
        zone.tell(actor, "You're unable to hold items.");
        return Ok(());
    }
    let Some(container) = Positioned::pick_nearby_inventory(zone, event, "container_descriptor")
    else {
        return Ok(());
    };
    event.container = Some(container);

    if container == actor {
        zone.tell(
            actor,
            "You can't get things from your inventory, they'd just go right back in!",
        );
        return Ok(());
    }
    if !Positioned::is_container(zone, container) {
        let title = title_of(zone, container);
        zone.tell(actor, format!("{title} can't hold items."));
        return Ok(());
    }

    let Some(target) = Positioned::pick_from(zone, event, "target_descriptor", container) else {
        return Ok(());
    };
    event.target = Some(target);

    if target == actor {
        zone.tell(actor, "You can't put yourself in your inventory.");
        return Ok(());
    }
    if !zone.has::<Positioned>(target) {
        let target_name = name_of(zone, target);
        let container_name = name_of(zone, container);
        zone.tell(
            actor,
            format!("You can't take {target_name} from {container_name}."),
        );
        return Ok(());
    }

    let witnesses = with_resolved(zone, actor, &[event.target, event.container]);
    zone.run_hooks(HookPoint::Before, take_from, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    let target_name = name_of(zone, target);
    let container_name = name_of(zone, container);
    zone.tell(
        actor,
        format!("You take {target_name} from {container_name}."),
    );
    Positioned::emit(
        zone,
        actor,
        &format!("{title} takes {target_name} from {container_name}."),
        &[target, container],
    );
    zone.tell(
        container,
        format!("{title} takes {target_name} from you."),
    );
    zone.tell(
        target,
        format!("{title} takes you from {container_name}."),
    );
    Positioned::move_to(zone, target, actor);

    zone.run_hooks(HookPoint::After, take_from, &witnesses, event)
}

pub fn put_in(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !zone.get::<Positioned>(actor).is_some_and(|p| p.is_container) {
        zone.tell(actor, "You're unable to hold things.");
        return Ok(());
    }
    let Some(target) = Positioned::pick_nearby_inventory(zone, event, "target_descriptor") else {
        return Ok(());
    };
    event.target = Some(target);

    if !zone.has::<Positioned>(target) {
        let target_name = name_of(zone, target);
        zone.tell(actor, format!("You can't put {target_name} into anything."));
        return Ok(());
    }

    let Some(container) = Positioned::pick_nearby_inventory(zone, event, "container_descriptor")
    else {
        return Ok(());
    };
    event.container = Some(container);

    if !Positioned::is_container(zone, container) {
        let title = title_of(zone, container);
        zone.tell(actor, format!("{title} can't hold things."));
        return Ok(());
    }

    let witnesses = with_resolved(zone, actor, &[event.target, event.container]);
    zone.run_hooks(HookPoint::Before, put_in, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    let target_name = name_of(zone, target);
    let container_name = name_of(zone, container);
    zone.tell(actor, format!("You put {target_name} in {container_name}."));
    Positioned::emit(
        zone,
        actor,
        &format!("{title} puts {target_name} in {container_name}."),
        &[target, container],
    );
    zone.tell(
        container,
        format!("{title} puts {target_name} in your inventory."),
    );
    zone.tell(target, format!("{title} puts you in {container_name}."));
    Positioned::move_to(zone, target, container);

    zone.run_hooks(HookPoint::After, put_in, &witnesses, event)
}

pub fn drop_item(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to drop things.") {
        return Ok(());
    }
    let Some(target) = Positioned::pick_inventory(zone, event, "descriptor") else {
        return Ok(());
    };
    event.target = Some(target);

    let Some(destination) = Positioned::container_of(zone, actor) else {
        zone.tell(actor, "There's nowhere to drop that.");
        return Ok(());
    };

    // Only the dropped item itself gets a chance to object.
    let witnesses = [target];
    zone.run_hooks(HookPoint::Before, drop_item, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    Positioned::move_to(zone, target, destination);
    let title = title_of(zone, actor);
    let target_name = name_of(zone, target);
    zone.tell(actor, format!("You drop {target_name}."));
    Positioned::emit(
        zone,
        actor,
        &format!("{title} drops {target_name}."),
        &[target],
    );
    zone.tell(target, format!("{title} drops you."));

    zone.run_hooks(HookPoint::After, drop_item, &witnesses, event)
}

pub fn walk(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to move.") {
        return Ok(());
    }
    let Some(room) = Positioned::container_of(zone, actor) else {
        zone.tell(actor, "You're unable to leave this place.");
        return Ok(());
    };

    let exits = Positioned::exits_of(zone, room);
    if exits.is_empty() {
        zone.tell(actor, "There don't seem to be any exits here.");
        return Ok(());
    }

    let wanted = event.capture("direction").unwrap_or("").to_lowercase();
    let Some((direction, destination)) = exits
        .into_iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
    else {
        zone.tell(actor, "You're unable to go that way.");
        return Ok(());
    };

    if !Positioned::is_container(zone, destination) {
        zone.tell(actor, "You're unable to go that way.");
        return Ok(());
    }
    event.target = Some(destination);

    let witnesses = with_resolved(zone, actor, &[event.target]);
    zone.run_hooks(HookPoint::Before, walk, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    let destination_name = name_of(zone, destination);
    let room_name = name_of(zone, room);
    zone.tell(actor, format!("You travel {direction}."));
    Positioned::emit(
        zone,
        actor,
        &format!("{title} travels {direction} to {destination_name}."),
        &[],
    );
    Positioned::announce(zone, destination, &format!("{title} arrives from {room_name}."));
    Positioned::move_to(zone, actor, destination);
    Positioned::tell_surroundings(zone, actor);

    zone.run_hooks(HookPoint::After, walk, &witnesses, event)
}

pub fn enter(zone: &mut Zone, event: &mut Event) -> Result<()> {
    let actor = event.actor;
    if !require_positioned(zone, actor, "You're unable to move.") {
        return Ok(());
    }
    let Some(room) = Positioned::container_of(zone, actor) else {
        zone.tell(actor, "You're unable to leave this place.");
        return Ok(());
    };
    let Some(container) = Positioned::pick_nearby(zone, event, "descriptor") else {
        return Ok(());
    };
    event.container = Some(container);

    let enterable = zone
        .get::<Positioned>(container)
        .is_some_and(|p| p.is_container && p.is_enterable);
    if !enterable {
        zone.tell(actor, "You can't enter that.");
        return Ok(());
    }

    let witnesses = with_resolved(zone, actor, &[event.container]);
    zone.run_hooks(HookPoint::Before, enter, &witnesses, event)?;
    if event.prevented {
        return Ok(());
    }

    let title = title_of(zone, actor);
    let container_name = name_of(zone, container);
    let room_name = name_of(zone, room);
    zone.tell(actor, format!("You enter {container_name}."));
    Positioned::emit(zone, actor, &format!("{title} enters {container_name}."), &[]);
    Positioned::announce(zone, container, &format!("{title} arrives from {room_name}."));
    Positioned::move_to(zone, actor, container);
    Positioned::tell_surroundings(zone, actor);

    zone.run_hooks(HookPoint::After, enter, &witnesses, event)
}

pub fn inventory(zone: &mut Zone, event: &mut Event) -> Result<()> {
    zone.perform(event.actor, "look in self")
}

macro_rules! direction_alias {
    ($handler:ident, $direction:literal) => {
        pub fn $handler(zone: &mut Zone, event: &mut Event) -> Result<()> {
            zone.perform(event.actor, concat!("go ", $direction))
        }
    };
}

direction_alias!(go_north, "north");
direction_alias!(go_south, "south");
direction_alias!(go_east, "east");
direction_alias!(go_west, "west");
direction_alias!(go_northeast, "northeast");
direction_alias!(go_northwest, "northwest");
direction_alias!(go_southeast, "southeast");
direction_alias!(go_southwest, "southwest");
direction_alias!(go_up, "up");
direction_alias!(go_down, "down");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_registry;
    use mudlark_engine::MemoryOutbox;
    use std::sync::Arc;

    fn test_zone() -> Zone {
        Zone::with_seed(default_registry().unwrap(), Arc::new(MemoryOutbox::new()), 1)
    }

    #[test]
    fn attach_links_into_container_contents() {
        let mut zone = test_zone();
        let room = zone.spawn("a room", "A room.");
        zone.attach(room, Box::new(Positioned::new().container()));
        let ball = zone.spawn("a ball", "A ball.");
        zone.attach(ball, Box::new(Positioned::new().carriable().inside(room)));

        assert_eq!(Positioned::contents_of(&zone, room), vec![ball]);
        assert_eq!(Positioned::container_of(&zone, ball), Some(room));
    }

    #[test]
    fn detach_reparents_contents() {
        let mut zone = test_zone();
        let room = zone.spawn("a room", "A room.");
        zone.attach(room, Box::new(Positioned::new().container()));
        let chest = zone.spawn("a chest", "A chest.");
        zone.attach(chest, Box::new(Positioned::new().container().inside(room)));
        let coin = zone.spawn("a coin", "A coin.");
        zone.attach(coin, Box::new(Positioned::new().carriable().inside(chest)));

        zone.detach(chest, Positioned::NAME);

        assert_eq!(Positioned::container_of(&zone, coin), Some(room));
        assert!(Positioned::contents_of(&zone, room).contains(&coin));
        assert!(!Positioned::contents_of(&zone, room).contains(&chest));
    }

    #[test]
    fn pick_matches_self_id_and_name_fragment() {
        let mut zone = test_zone();
        let room = zone.spawn("a room", "A room.");
        zone.attach(room, Box::new(Positioned::new().container()));
        let ball = zone.spawn("a rubber ball", "Bouncy.");
        zone.attach(ball, Box::new(Positioned::new().carriable().inside(room)));
        let player = zone.spawn("Player", "You.");
        zone.attach(player, Box::new(Positioned::new().container().inside(room)));

        let pool = Positioned::nearby(&zone, player);
        assert_eq!(Positioned::pick(&zone, player, "rubber", &pool), vec![ball]);
        assert_eq!(
            Positioned::pick(&zone, player, &ball.to_string(), &pool),
            vec![ball]
        );
        assert_eq!(Positioned::pick(&zone, player, "self", &pool), vec![player]);
        assert!(Positioned::pick(&zone, player, "dragon", &pool).is_empty());
    }

    #[test]
    fn pick_skips_invisible_entities() {
        let mut zone = test_zone();
        let room = zone.spawn("a room", "A room.");
        zone.attach(room, Box::new(Positioned::new().container()));
        let ghost = zone.spawn("a ghost", "Spooky.");
        zone.attach(ghost, Box::new(Positioned::new().hidden().inside(room)));
        let player = zone.spawn("Player", "You.");
        zone.attach(player, Box::new(Positioned::new().container().inside(room)));

        let pool = Positioned::nearby(&zone, player);
        assert!(Positioned::pick(&zone, player, "ghost", &pool).is_empty());
    }

    #[test]
    fn link_creates_bidirectional_exits() {
        let mut zone = test_zone();
        let yard = zone.spawn("a yard", "A yard.");
        zone.attach(yard, Box::new(Positioned::new().container()));
        let shed = zone.spawn("a shed", "A shed.");
        zone.attach(shed, Box::new(Positioned::new().container()));

        Positioned::link(&mut zone, yard, "north", shed, Some("south"));

        assert_eq!(
            Positioned::exits_of(&zone, yard),
            vec![("north".to_string(), shed)]
        );
        assert_eq!(
            Positioned::exits_of(&zone, shed),
            vec![("south".to_string(), yard)]
        );
    }
}
