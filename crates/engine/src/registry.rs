//! Capability registry: name-indexed runtime metadata for every loaded
//! capability type.
//!
//! Built once at startup from explicit, ordered registration calls and
//! immutable afterwards. Command patterns are compiled here and kept in
//! registration order (the deterministic tie-break for equal-length
//! patterns), and hook declarations are resolved from handler fn-pointer
//! identity into a lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::capability::{ActionFn, Capability, CapabilityDef, CapabilityKind, HookFn, HookPoint};
use crate::error::{EngineError, Result};

/// A compiled command pattern, kept in registration order.
pub struct CompiledCommand {
    pub name: &'static str,
    pub capability: &'static str,
    pub pattern: &'static str,
    pub regex: Regex,
    pub handler: ActionFn,
}

/// A hook resolved at build time, tagged with the capability that declared
/// it. Hooks only fire on witnesses that carry that capability.
pub struct RegisteredHook {
    pub capability: &'static str,
    pub hook: HookFn,
}

/// Read-only after load. Shared across the zone via `Arc`.
pub struct Registry {
    commands: Vec<CompiledCommand>,
    commands_by_name: HashMap<&'static str, usize>,
    hooks: HashMap<(usize, HookPoint), Vec<RegisteredHook>>,
    capabilities: HashMap<&'static str, CapabilityDef>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Unknown names are a recoverable condition for the caller (e.g. an
    /// admin command answering "No such component"), not a crash.
    pub fn lookup(&self, name: &str) -> Option<&CapabilityDef> {
        self.capabilities.get(name)
    }

    /// Reconstructs a capability instance from a persisted record.
    pub fn revive(&self, name: &str, record: Value) -> Result<Box<dyn Capability>> {
        let def = self
            .lookup(name)
            .ok_or_else(|| EngineError::UnknownCapability(name.to_string()))?;
        (def.revive)(record)
    }

    pub fn commands(&self) -> &[CompiledCommand] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CompiledCommand> {
        self.commands_by_name.get(name).map(|&i| &self.commands[i])
    }

    /// Hooks registered against the given handler and hook point, in
    /// registration order.
    pub fn hooks_for(&self, target: ActionFn, point: HookPoint) -> &[RegisteredHook] {
        self.hooks
            .get(&(target as usize, point))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if the named capability declares per-tick behavior.
    pub fn is_ticking(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|def| def.tick.is_some())
    }
}

/// Collects [`CapabilityDef`]s in explicit order and compiles them into an
/// immutable [`Registry`]. Build failures are fatal startup errors.
#[derive(Default)]
pub struct RegistryBuilder {
    defs: Vec<CapabilityDef>,
}

impl RegistryBuilder {
    pub fn register<C: CapabilityKind>(&mut self) -> &mut Self {
        self.defs.push(C::definition());
        self
    }

    pub fn register_def(&mut self, def: CapabilityDef) -> &mut Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<Arc<Registry>> {
        let mut commands = Vec::new();
        let mut commands_by_name = HashMap::new();
        let mut hooks: HashMap<(usize, HookPoint), Vec<RegisteredHook>> = HashMap::new();
        let mut seen = std::collections::HashSet::new();

        for def in &self.defs {
            if !seen.insert(def.name) {
                return Err(EngineError::DuplicateCapability(def.name));
            }

            for command in &def.commands {
                let regex = Regex::new(command.pattern).map_err(|source| {
                    EngineError::InvalidPattern {
                        command: command.name,
                        pattern: command.pattern,
                        source: Box::new(source),
                    }
                })?;
                if commands_by_name
                    .insert(command.name, commands.len())
                    .is_some()
                {
                    return Err(EngineError::DuplicateCommand(command.name));
                }
                commands.push(CompiledCommand {
                    name: command.name,
                    capability: def.name,
                    pattern: command.pattern,
                    regex,
                    handler: command.handler,
                });
            }
        }

        // Hooks may target handlers registered by other capabilities, so
        // resolve them only after every command is known.
        for def in &self.defs {
            for hook_def in &def.hooks {
                let target = hook_def.target as usize;
                if !commands.iter().any(|c| c.handler as usize == target) {
                    return Err(EngineError::UnknownHookTarget {
                        capability: def.name,
                    });
                }
                hooks
                    .entry((target, hook_def.point))
                    .or_default()
                    .push(RegisteredHook {
                        capability: def.name,
                        hook: hook_def.hook,
                    });
            }
        }

        let capabilities = self
            .defs
            .into_iter()
            .map(|def| (def.name, def))
            .collect::<HashMap<_, _>>();

        tracing::debug!(
            capabilities = capabilities.len(),
            commands = commands.len(),
            "registry built"
        );

        Ok(Arc::new(Registry {
            commands,
            commands_by_name,
            hooks,
            capabilities,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CommandDef, HookDef};
    use crate::entity::EntityId;
    use crate::event::Event;
    use crate::zone::Zone;

    fn noop(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn other(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn noop_hook(_zone: &mut Zone, _witness: EntityId, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn revive_nothing(_record: Value) -> Result<Box<dyn Capability>> {
        Err(EngineError::UnknownCapability("test".into()))
    }

    fn def(name: &'static str) -> CapabilityDef {
        CapabilityDef {
            name,
            revive: revive_nothing,
            tick: None,
            commands: Vec::new(),
            hooks: Vec::new(),
        }
    }

    #[test]
    fn duplicate_capability_names_are_rejected() {
        let mut builder = RegistryBuilder::default();
        builder.register_def(def("Twin")).register_def(def("Twin"));
        assert!(matches!(
            builder.build(),
            Err(EngineError::DuplicateCapability("Twin"))
        ));
    }

    #[test]
    fn hooks_resolve_by_handler_identity() {
        let mut builder = RegistryBuilder::default();
        let mut speaking = def("Speaking");
        speaking.commands.push(CommandDef {
            name: "speak",
            pattern: "^speak$",
            handler: noop,
        });
        let mut listener = def("Listener");
        listener.hooks.push(HookDef {
            point: HookPoint::Before,
            target: noop,
            hook: noop_hook,
        });
        builder.register_def(speaking).register_def(listener);
        let registry = builder.build().unwrap();

        assert_eq!(registry.hooks_for(noop, HookPoint::Before).len(), 1);
        assert_eq!(registry.hooks_for(noop, HookPoint::After).len(), 0);
        assert_eq!(registry.hooks_for(other, HookPoint::Before).len(), 0);
    }

    #[test]
    fn hook_targeting_unregistered_handler_fails_build() {
        let mut builder = RegistryBuilder::default();
        let mut orphan = def("Orphan");
        orphan.hooks.push(HookDef {
            point: HookPoint::Before,
            target: noop,
            hook: noop_hook,
        });
        builder.register_def(orphan);
        assert!(matches!(
            builder.build(),
            Err(EngineError::UnknownHookTarget { capability: "Orphan" })
        ));
    }

    #[test]
    fn unknown_capability_lookup_is_recoverable() {
        let registry = RegistryBuilder::default().build().unwrap();
        assert!(registry.lookup("Ghost").is_none());
        assert!(matches!(
            registry.revive("Ghost", Value::Null),
            Err(EngineError::UnknownCapability(name)) if name == "Ghost"
        ));
    }
}
