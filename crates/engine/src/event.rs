//! Transient per-invocation event passed between a handler and its hooks.

use std::collections::BTreeMap;

use crate::entity::EntityId;

/// Created once per matched command. Carries the acting entity, the named
/// captures from the matched pattern, a side-channel for resolved entities,
/// and the `prevented` veto flag.
///
/// Hooks may mutate captures (e.g. override a paint color) and resolved
/// fields; competing writes are last-write-wins in dispatch order.
#[derive(Debug, Clone)]
pub struct Event {
    /// Registered name of the matched command.
    pub command: &'static str,
    pub actor: EntityId,
    pub captures: BTreeMap<String, String>,
    /// Resolved target entity, stashed by the handler for hooks to read.
    pub target: Option<EntityId>,
    /// Resolved container entity, where the command involves one.
    pub container: Option<EntityId>,
    /// Set by a `before` hook to veto the handler's default effects.
    pub prevented: bool,
}

impl Event {
    pub fn new(command: &'static str, actor: EntityId, captures: BTreeMap<String, String>) -> Self {
        Self {
            command,
            actor,
            captures,
            target: None,
            container: None,
            prevented: false,
        }
    }

    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    pub fn set_capture(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captures.insert(name.into(), value.into());
    }

    pub fn prevent(&mut self) {
        self.prevented = true;
    }
}
