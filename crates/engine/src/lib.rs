//! Entity-component runtime for a multiplayer text world.
//!
//! `mudlark-engine` defines the canonical core: entities assembled at runtime
//! from independent capabilities, a command router that matches free text
//! against capability-declared patterns, and a before/after hook protocol
//! that lets capabilities observe and veto each other's actions. All state
//! mutation flows through [`Zone`], which is owned by exactly one logical
//! thread of control; the async shell lives in `mudlark-runtime`.
pub mod capability;
pub mod entity;
pub mod error;
pub mod event;
pub mod mode;
pub mod outbox;
pub mod registry;
pub mod router;
pub mod snapshot;
pub mod zone;

pub use capability::{
    ActionFn, Capability, CapabilityDef, CapabilityKind, CommandDef, HookDef, HookFn, HookPoint,
    TickFn, revive_from_record,
};
pub use entity::{Entity, EntityId};
pub use error::{EngineError, Result};
pub use event::Event;
pub use mode::{DisambiguateState, Mode};
pub use outbox::{MemoryOutbox, Outbox, OutboundMessage, messages_key};
pub use registry::{Registry, RegistryBuilder};
pub use snapshot::{EntityRecord, ZoneSnapshot};
pub use zone::Zone;
