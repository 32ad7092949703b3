//! The polymorphic unit of behavior and state attachable to entities.
//!
//! A capability is a plain serde struct plus a static [`CapabilityDef`] that
//! declares, at registration time, the command patterns it handles, the hook
//! points it wants notified on, and whether it acts on the zone tick. The
//! definition is consumed once by [`crate::RegistryBuilder`]; nothing is
//! discovered by reflection or import-time side effects.

use std::any::Any;

use serde_json::Value;

use crate::entity::EntityId;
use crate::error::Result;
use crate::event::Event;
use crate::zone::Zone;

/// A primary command handler. Handlers run their declared hook points
/// explicitly via [`Zone::run_hooks`] and skip their default effects when the
/// event has been prevented.
pub type ActionFn = fn(&mut Zone, &mut Event) -> Result<()>;

/// A hook invoked at a handler's hook point, once per witnessing entity that
/// carries the declaring capability.
pub type HookFn = fn(&mut Zone, EntityId, &mut Event) -> Result<()>;

/// Per-tick behavior, invoked once per zone tick for each owning entity.
pub type TickFn = fn(&mut Zone, EntityId) -> Result<()>;

/// Reconstructs a capability instance from its persisted record.
pub type ReviveFn = fn(Value) -> Result<Box<dyn Capability>>;

/// Named phase inside a primary handler where other capabilities may
/// observe or veto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPoint {
    Before,
    After,
}

/// A command pattern declared by a capability.
pub struct CommandDef {
    /// Stable name, unique across all loaded capabilities. Used to identify
    /// the pending command inside serialized disambiguation state.
    pub name: &'static str,
    /// Anchored regex with named captures.
    pub pattern: &'static str,
    pub handler: ActionFn,
}

/// A (hook point, target handler) pair a capability wants notified on.
///
/// The target is the handler's `'static` fn pointer, not its name, so
/// same-named commands in different capabilities can never collide.
pub struct HookDef {
    pub point: HookPoint,
    pub target: ActionFn,
    pub hook: HookFn,
}

/// Everything the registry needs to instantiate, serialize, and dispatch to
/// one capability type.
pub struct CapabilityDef {
    pub name: &'static str,
    pub revive: ReviveFn,
    pub tick: Option<TickFn>,
    pub commands: Vec<CommandDef>,
    pub hooks: Vec<HookDef>,
}

/// Object-safe capability instance.
///
/// Lifecycle callbacks receive the owning entity id explicitly; instances do
/// not store a back-reference. `on_attach` runs before the instance is
/// inserted into the entity's capability map, `on_detach` after removal, so
/// both may freely mutate the rest of the zone.
pub trait Capability: Any + Send + Sync {
    fn name(&self) -> &'static str;

    /// Plain structured record for persistence. Must round-trip losslessly
    /// through the definition's `revive`.
    fn to_record(&self) -> Result<Value>;

    fn on_attach(&mut self, _zone: &mut Zone, _owner: EntityId) {}

    fn on_detach(&mut self, _zone: &mut Zone, _owner: EntityId) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Static half of a capability type: its registry name and definition.
pub trait CapabilityKind: Capability + Sized {
    const NAME: &'static str;

    fn definition() -> CapabilityDef;
}

/// Implements the boilerplate half of [`Capability`] for a serde struct.
/// The type still provides its own `definition()` and any lifecycle
/// callbacks via an explicit `Capability` impl when it needs them.
#[macro_export]
macro_rules! capability_record {
    ($ty:ty, $name:literal) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn to_record(&self) -> $crate::Result<::serde_json::Value> {
            ::serde_json::to_value(self).map_err(|source| $crate::EngineError::SerializeRecord {
                name: $name.to_string(),
                source,
            })
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

/// Standard `revive` implementation for serde capabilities.
pub fn revive_from_record<C>(record: Value) -> Result<Box<dyn Capability>>
where
    C: Capability + serde::de::DeserializeOwned + CapabilityKind,
{
    let cap: C = serde_json::from_value(record).map_err(|source| {
        crate::error::EngineError::BadRecord {
            name: C::NAME.to_string(),
            source,
        }
    })?;
    Ok(Box::new(cap))
}
