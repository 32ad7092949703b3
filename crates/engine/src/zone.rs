//! Single-threaded authority over one zone's entities.
//!
//! The zone owns the entity table, the ticking set, the capability registry,
//! and the outbound message seam. Everything that mutates world state runs
//! through `&mut Zone` on one logical thread of control; the async shell in
//! `mudlark-runtime` feeds it commands and ticks from an MPSC queue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::capability::{ActionFn, Capability, CapabilityKind, HookPoint};
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::event::Event;
use crate::mode::{DisambiguateState, Mode};
use crate::outbox::{Outbox, OutboundMessage, messages_key};
use crate::registry::Registry;
use crate::router;
use crate::snapshot::{EntityRecord, ZoneSnapshot};

const UNKNOWN_COMMAND_REPLIES: &[&str] = &["What?", "Eh?", "Come again?", "Unknown command."];

pub struct Zone {
    entities: HashMap<EntityId, Entity>,
    /// Entities with at least one ticking capability, in insertion order so
    /// per-tick dispatch is stable run-to-run.
    ticking: Vec<EntityId>,
    registry: Arc<Registry>,
    outbox: Arc<dyn Outbox>,
    rng: StdRng,
    next_id: u64,
    running: bool,
    snapshot_requested: bool,
}

impl Zone {
    pub fn new(registry: Arc<Registry>, outbox: Arc<dyn Outbox>) -> Self {
        Self::with_rng(registry, outbox, StdRng::from_entropy())
    }

    /// Seeded construction for deterministic tests of probabilistic content.
    pub fn with_seed(registry: Arc<Registry>, outbox: Arc<dyn Outbox>, seed: u64) -> Self {
        Self::with_rng(registry, outbox, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: Arc<Registry>, outbox: Arc<dyn Outbox>, rng: StdRng) -> Self {
        Self {
            entities: HashMap::new(),
            ticking: Vec::new(),
            registry,
            outbox,
            rng,
            next_id: 0,
            running: true,
            snapshot_requested: false,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    pub fn spawn(&mut self, name: impl Into<String>, desc: impl Into<String>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        let entity = Entity::new(id, name, desc);
        debug!(%id, name = %entity.name, "spawned entity");
        self.entities.insert(id, entity);
        id
    }

    /// Detaches every capability (firing detach cleanup such as spatial
    /// unlinking) and removes the entity from the table.
    pub fn destroy(&mut self, id: EntityId) {
        let names = match self.entities.get(&id) {
            Some(entity) => entity.capability_names(),
            None => return,
        };
        for name in names {
            self.detach(id, name);
        }
        self.entities.remove(&id);
        self.ticking.retain(|&t| t != id);
        debug!(%id, "destroyed entity");
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    // ------------------------------------------------------------------
    // Capability store
    // ------------------------------------------------------------------

    /// Binds a capability to the entity. Re-attaching a capability of the
    /// same name replaces the old instance, detaching it first. The ticking
    /// set is kept consistent.
    pub fn attach(&mut self, id: EntityId, mut cap: Box<dyn Capability>) {
        let name = cap.name();
        if !self.entities.contains_key(&id) {
            warn!(%id, capability = name, "attach to unknown entity dropped");
            return;
        }
        if self.entities[&id].has_named(name) {
            self.detach(id, name);
        }
        cap.on_attach(self, id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.insert_capability(name, cap);
        }
        self.refresh_ticking(id);
    }

    pub fn detach(&mut self, id: EntityId, name: &str) {
        let Some(mut cap) = self
            .entities
            .get_mut(&id)
            .and_then(|e| e.remove_capability(name))
        else {
            return;
        };
        cap.on_detach(self, id);
        self.refresh_ticking(id);
    }

    pub fn has<C: CapabilityKind>(&self, id: EntityId) -> bool {
        self.has_named(id, C::NAME)
    }

    pub fn has_named(&self, id: EntityId, name: &str) -> bool {
        self.entities.get(&id).is_some_and(|e| e.has_named(name))
    }

    pub fn get<C: CapabilityKind>(&self, id: EntityId) -> Option<&C> {
        self.entities.get(&id).and_then(Entity::get)
    }

    pub fn get_mut<C: CapabilityKind>(&mut self, id: EntityId) -> Option<&mut C> {
        self.entities.get_mut(&id).and_then(Entity::get_mut)
    }

    pub fn ticking_entities(&self) -> &[EntityId] {
        &self.ticking
    }

    fn refresh_ticking(&mut self, id: EntityId) {
        let ticks = self.entities.get(&id).is_some_and(|e| {
            e.capability_names()
                .iter()
                .any(|name| self.registry.is_ticking(name))
        });
        let present = self.ticking.contains(&id);
        if ticks && !present {
            self.ticking.push(id);
        } else if !ticks && present {
            self.ticking.retain(|&t| t != id);
        }
    }

    // ------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------

    /// Best-effort delivery to the entity's outbound channel. No-op when the
    /// entity does not currently accept messages.
    pub fn tell(&mut self, id: EntityId, text: impl Into<String>) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        if !entity.hearing {
            return;
        }
        self.outbox
            .deliver(&messages_key(id), &OutboundMessage::Message {
                text: text.into(),
            });
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Interprets raw input according to the entity's current mode. Absent
    /// entities are silently dropped (they may have been destroyed since the
    /// command was enqueued); entities without a mode drop the command with
    /// a logged warning.
    pub fn perform(&mut self, id: EntityId, input: &str) -> Result<()> {
        let Some(entity) = self.entities.get(&id) else {
            debug!(%id, input, "command for unknown entity dropped");
            return Ok(());
        };
        let Some(mode) = entity.mode.clone() else {
            warn!(%id, input, "entity has no mode; command dropped");
            return Ok(());
        };
        match mode {
            Mode::Action => self.perform_action(id, input),
            Mode::Disambiguate(state) => self.perform_disambiguation(id, state, input),
        }
    }

    fn perform_action(&mut self, id: EntityId, input: &str) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let input = router::normalize(input);
        match router::route(&registry, &input) {
            Some((command, captures)) => {
                debug!(%id, command = command.name, input = %input, "dispatching");
                let mut event = Event::new(command.name, id, captures);
                (command.handler)(self, &mut event)
            }
            None => {
                let reply =
                    UNKNOWN_COMMAND_REPLIES[self.rng.gen_range(0..UNKNOWN_COMMAND_REPLIES.len())];
                self.tell(id, reply);
                Ok(())
            }
        }
    }

    fn perform_disambiguation(
        &mut self,
        id: EntityId,
        state: DisambiguateState,
        input: &str,
    ) -> Result<()> {
        // Revert to the prior mode before doing anything else; both the
        // index path and the fallback path leave disambiguation.
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mode = Some((*state.previous).clone());
        }

        let choice = input.trim().parse::<usize>().ok();
        match choice {
            Some(n) if n >= 1 && n <= state.candidates.len() => {
                let chosen = state.candidates[n - 1];
                let mut captures = state.captures;
                captures.insert(state.slot, chosen.to_string());
                self.invoke(id, &state.command, captures)
            }
            // Not a valid index: reinterpret the raw input as a fresh
            // command so players can type their way out.
            _ => self.perform(id, input),
        }
    }

    /// Invokes a registered command by name with pre-bound captures,
    /// bypassing pattern matching. Used to re-run a pending command after
    /// disambiguation and by capabilities that act on another entity's
    /// behalf. Unregistered names are dropped with a warning.
    pub fn invoke(
        &mut self,
        id: EntityId,
        command: &str,
        captures: BTreeMap<String, String>,
    ) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let Some(command) = registry.command(command) else {
            warn!(%id, command, "pending command vanished from registry; dropped");
            return Ok(());
        };
        let mut event = Event::new(command.name, id, captures);
        (command.handler)(self, &mut event)
    }

    // ------------------------------------------------------------------
    // Hook dispatch
    // ------------------------------------------------------------------

    /// Fans a hook point out to every witness. Per witness, capabilities are
    /// consulted in attachment order; within one capability, hooks run in
    /// registration order. Competing writes to `event.prevented` are
    /// last-write-wins in that order.
    pub fn run_hooks(
        &mut self,
        point: HookPoint,
        target: ActionFn,
        witnesses: &[EntityId],
        event: &mut Event,
    ) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let hooks = registry.hooks_for(target, point);
        if hooks.is_empty() {
            return Ok(());
        }
        for &witness in witnesses {
            let Some(names) = self.entities.get(&witness).map(Entity::capability_names) else {
                continue;
            };
            for name in names {
                for registered in hooks.iter().filter(|h| h.capability == name) {
                    (registered.hook)(self, witness, event)?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Runs every ticking capability on every ticking entity once, in
    /// insertion order. Tick handlers are expected to be fast; a slow one
    /// delays the whole zone.
    pub fn perform_tick(&mut self) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        for id in self.ticking.clone() {
            let Some(names) = self.entities.get(&id).map(Entity::capability_names) else {
                continue;
            };
            for name in names {
                // A previous tick handler may have detached the capability.
                if !self.has_named(id, name) {
                    continue;
                }
                if let Some(tick) = registry.lookup(name).and_then(|def| def.tick) {
                    tick(self, id)?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Run state
    // ------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Cooperative stop: observed by the loop after the current event.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Asks the loop to save a snapshot after the current event.
    pub fn request_snapshot(&mut self) {
        self.snapshot_requested = true;
    }

    pub fn take_snapshot_request(&mut self) -> bool {
        std::mem::take(&mut self.snapshot_requested)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Point-in-time plain-record copy of every entity, ordered by id.
    pub fn to_snapshot(&self) -> Result<ZoneSnapshot> {
        let mut entities = Vec::with_capacity(self.entities.len());
        for id in self.entity_ids() {
            let entity = &self.entities[&id];
            let mut components = BTreeMap::new();
            for (name, cap) in entity.capabilities() {
                components.insert(name.to_string(), cap.to_record()?);
            }
            entities.push(EntityRecord {
                id,
                name: entity.name.clone(),
                desc: entity.desc.clone(),
                hearing: entity.hearing,
                mode: entity.mode.clone(),
                components,
            });
        }
        Ok(ZoneSnapshot { entities })
    }

    /// Reconstructs entities from a snapshot. Entities are created first and
    /// capabilities attached second, so attach-time cleanup (e.g. spatial
    /// linking) can resolve cross-entity references. Unknown capability
    /// names are skipped with a warning; malformed records are fatal.
    pub fn load_snapshot(&mut self, snapshot: ZoneSnapshot) -> Result<()> {
        for record in &snapshot.entities {
            let mut entity = Entity::new(record.id, record.name.clone(), record.desc.clone());
            entity.hearing = record.hearing;
            entity.mode = record.mode.clone();
            self.next_id = self.next_id.max(record.id.0);
            self.entities.insert(record.id, entity);
        }

        let registry = Arc::clone(&self.registry);
        for record in snapshot.entities {
            for (name, cap_record) in record.components {
                if registry.lookup(&name).is_none() {
                    warn!(id = %record.id, capability = %name, "unknown capability in snapshot; skipped");
                    continue;
                }
                let cap = registry.revive(&name, cap_record)?;
                self.attach(record.id, cap);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityDef, CapabilityKind, CommandDef};
    use crate::capability_record;
    use crate::outbox::MemoryOutbox;
    use crate::registry::RegistryBuilder;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Pulse {
        #[serde(default)]
        beats: u64,
    }

    fn pulse_tick(zone: &mut Zone, owner: EntityId) -> Result<()> {
        if let Some(pulse) = zone.get_mut::<Pulse>(owner) {
            pulse.beats += 1;
        }
        Ok(())
    }

    impl Capability for Pulse {
        capability_record!(Pulse, "Pulse");
    }

    impl CapabilityKind for Pulse {
        const NAME: &'static str = "Pulse";

        fn definition() -> CapabilityDef {
            CapabilityDef {
                name: Self::NAME,
                revive: crate::capability::revive_from_record::<Pulse>,
                tick: Some(pulse_tick),
                commands: Vec::new(),
                hooks: Vec::new(),
            }
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Inert;

    impl Capability for Inert {
        capability_record!(Inert, "Inert");
    }

    impl CapabilityKind for Inert {
        const NAME: &'static str = "Inert";

        fn definition() -> CapabilityDef {
            CapabilityDef {
                name: Self::NAME,
                revive: crate::capability::revive_from_record::<Inert>,
                tick: None,
                commands: Vec::new(),
                hooks: Vec::new(),
            }
        }
    }

    fn shout(zone: &mut Zone, event: &mut Event) -> Result<()> {
        let actor = event.actor;
        zone.tell(actor, "You shout.");
        Ok(())
    }

    fn test_registry() -> Arc<Registry> {
        let mut builder = RegistryBuilder::default();
        builder.register::<Pulse>().register::<Inert>();
        builder.register_def(CapabilityDef {
            name: "Loud",
            revive: |_| Ok(Box::new(Inert) as Box<dyn Capability>),
            tick: None,
            commands: vec![CommandDef {
                name: "shout",
                pattern: r"^shout$",
                handler: shout,
            }],
            hooks: Vec::new(),
        });
        builder.build().unwrap()
    }

    fn test_zone() -> (Zone, Arc<MemoryOutbox>) {
        let outbox = Arc::new(MemoryOutbox::new());
        let zone = Zone::with_seed(test_registry(), outbox.clone(), 7);
        (zone, outbox)
    }

    #[test]
    fn ticking_set_is_idempotent_across_reattach() {
        let (mut zone, _outbox) = test_zone();
        let id = zone.spawn("clock", "Tick tock.");

        zone.attach(id, Box::new(Pulse::default()));
        zone.attach(id, Box::new(Pulse { beats: 3 }));
        assert_eq!(zone.ticking_entities(), &[id]);

        // Replacement kept the new instance's state.
        assert_eq!(zone.get::<Pulse>(id).unwrap().beats, 3);

        zone.detach(id, Pulse::NAME);
        assert!(zone.ticking_entities().is_empty());
    }

    #[test]
    fn detaching_non_ticking_capability_keeps_entity_ticking() {
        let (mut zone, _outbox) = test_zone();
        let id = zone.spawn("clock", "Tick tock.");
        zone.attach(id, Box::new(Pulse::default()));
        zone.attach(id, Box::new(Inert));
        zone.detach(id, Inert::NAME);
        assert_eq!(zone.ticking_entities(), &[id]);
    }

    #[test]
    fn tick_runs_each_ticking_capability_once() {
        let (mut zone, _outbox) = test_zone();
        let a = zone.spawn("a", "A.");
        let b = zone.spawn("b", "B.");
        zone.attach(a, Box::new(Pulse::default()));
        zone.attach(b, Box::new(Pulse::default()));

        zone.perform_tick().unwrap();
        zone.perform_tick().unwrap();

        assert_eq!(zone.get::<Pulse>(a).unwrap().beats, 2);
        assert_eq!(zone.get::<Pulse>(b).unwrap().beats, 2);
    }

    #[test]
    fn unknown_command_tells_filler_without_error() {
        let (mut zone, outbox) = test_zone();
        let id = zone.spawn("player", "You.");
        zone.entity_mut(id).unwrap().hearing = true;

        zone.perform(id, "flail wildly").unwrap();
        let texts = outbox.texts_for(id);
        assert_eq!(texts.len(), 1);
        assert!(UNKNOWN_COMMAND_REPLIES.contains(&texts[0].as_str()));
    }

    #[test]
    fn entity_without_mode_drops_commands() {
        let (mut zone, outbox) = test_zone();
        let id = zone.spawn("statue", "Still.");
        zone.entity_mut(id).unwrap().hearing = true;
        zone.entity_mut(id).unwrap().mode = None;

        zone.perform(id, "shout").unwrap();
        assert!(outbox.texts_for(id).is_empty());
    }

    #[test]
    fn command_for_absent_entity_is_dropped() {
        let (mut zone, _outbox) = test_zone();
        zone.perform(EntityId(999), "shout").unwrap();
    }

    #[test]
    fn tell_respects_hearing() {
        let (mut zone, outbox) = test_zone();
        let deaf = zone.spawn("rock", "A rock.");
        zone.tell(deaf, "hello");
        assert!(outbox.texts_for(deaf).is_empty());

        zone.entity_mut(deaf).unwrap().hearing = true;
        zone.tell(deaf, "hello");
        assert_eq!(outbox.texts_for(deaf), vec!["hello".to_string()]);
    }

    #[test]
    fn snapshot_round_trips_entities_and_capability_state() {
        let (mut zone, _outbox) = test_zone();
        let id = zone.spawn("clock", "Tick tock.");
        zone.entity_mut(id).unwrap().hearing = true;
        zone.attach(id, Box::new(Pulse { beats: 42 }));

        let snapshot = zone.to_snapshot().unwrap();

        let (mut reloaded, _outbox2) = test_zone();
        reloaded.load_snapshot(snapshot).unwrap();

        assert_eq!(reloaded.entity(id).unwrap().name, "clock");
        assert!(reloaded.entity(id).unwrap().hearing);
        assert_eq!(reloaded.get::<Pulse>(id).unwrap().beats, 42);
        assert_eq!(reloaded.ticking_entities(), &[id]);

        // New spawns do not reuse restored ids.
        let fresh = reloaded.spawn("new", "New.");
        assert!(fresh.0 > id.0);
    }

    #[test]
    fn snapshot_skips_unknown_capabilities_on_load() {
        let record = EntityRecord {
            id: EntityId(1),
            name: "relic".into(),
            desc: "Old.".into(),
            hearing: false,
            mode: Some(Mode::Action),
            components: BTreeMap::from([
                ("Pulse".to_string(), serde_json::json!({"beats": 1})),
                ("Forgotten".to_string(), serde_json::json!({})),
            ]),
        };
        let (mut zone, _outbox) = test_zone();
        zone.load_snapshot(ZoneSnapshot {
            entities: vec![record],
        })
        .unwrap();

        assert_eq!(zone.get::<Pulse>(EntityId(1)).unwrap().beats, 1);
        assert!(!zone.has_named(EntityId(1), "Forgotten"));
    }

    #[test]
    fn destroy_detaches_and_removes() {
        let (mut zone, _outbox) = test_zone();
        let id = zone.spawn("clock", "Tick tock.");
        zone.attach(id, Box::new(Pulse::default()));
        zone.destroy(id);
        assert!(zone.entity(id).is_none());
        assert!(zone.ticking_entities().is_empty());
    }
}
