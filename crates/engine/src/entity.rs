//! Game objects: a stable id plus an insertion-ordered set of capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilityKind};
use crate::mode::Mode;

/// Zone-unique, stable entity identifier. Assigned at creation, immutable
/// thereafter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A game object. Capabilities are kept in attachment order, at most one
/// instance per capability name; re-attaching replaces.
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub desc: String,
    /// Gates `tell`: entities that are not hearing receive no messages.
    pub hearing: bool,
    /// Current input-interpretation mode. `None` drops commands with a
    /// logged warning.
    pub mode: Option<Mode>,
    caps: Vec<(&'static str, Box<dyn Capability>)>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            desc: desc.into(),
            hearing: false,
            mode: Some(Mode::Action),
            caps: Vec::new(),
        }
    }

    /// Attached capability names in attachment order.
    pub fn capability_names(&self) -> Vec<&'static str> {
        self.caps.iter().map(|(name, _)| *name).collect()
    }

    pub fn has_named(&self, name: &str) -> bool {
        self.caps.iter().any(|(n, _)| *n == name)
    }

    pub fn get<C: CapabilityKind>(&self) -> Option<&C> {
        self.caps
            .iter()
            .find(|(n, _)| *n == C::NAME)
            .and_then(|(_, cap)| cap.as_any().downcast_ref::<C>())
    }

    pub fn get_mut<C: CapabilityKind>(&mut self) -> Option<&mut C> {
        self.caps
            .iter_mut()
            .find(|(n, _)| *n == C::NAME)
            .and_then(|(_, cap)| cap.as_any_mut().downcast_mut::<C>())
    }

    pub fn capabilities(&self) -> impl Iterator<Item = (&'static str, &dyn Capability)> {
        self.caps.iter().map(|(n, cap)| (*n, cap.as_ref()))
    }

    pub(crate) fn insert_capability(&mut self, name: &'static str, cap: Box<dyn Capability>) {
        debug_assert!(!self.has_named(name));
        self.caps.push((name, cap));
    }

    pub(crate) fn remove_capability(&mut self, name: &str) -> Option<Box<dyn Capability>> {
        let index = self.caps.iter().position(|(n, _)| *n == name)?;
        Some(self.caps.remove(index).1)
    }

    /// Name with the first letter upcased, for sentence-leading use.
    pub fn title(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
