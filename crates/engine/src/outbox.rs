//! Outbound message delivery seam.
//!
//! The engine treats the transport as a black box with at-least-once,
//! best-effort delivery: messages are pushed to a per-entity channel keyed by
//! the entity id. The async runtime plugs in a real bus; tests use
//! [`MemoryOutbox`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Deterministic outbound channel key for an entity.
pub fn messages_key(id: EntityId) -> String {
    format!("entity:{id}:messages")
}

/// Payload delivered to connected clients. Tagged so richer record types can
/// be added without breaking renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Message { text: String },
}

impl OutboundMessage {
    pub fn text(&self) -> &str {
        match self {
            OutboundMessage::Message { text } => text,
        }
    }
}

/// Best-effort message sink. Implementations must not block the zone loop.
pub trait Outbox: Send + Sync {
    fn deliver(&self, key: &str, message: &OutboundMessage);
}

/// Records deliveries in memory for inspection.
#[derive(Default)]
pub struct MemoryOutbox {
    messages: Mutex<Vec<(String, OutboundMessage)>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// All texts delivered to the given entity's channel, in order.
    pub fn texts_for(&self, id: EntityId) -> Vec<String> {
        let key = messages_key(id);
        self.messages
            .lock()
            .expect("outbox poisoned")
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, m)| m.text().to_string())
            .collect()
    }

    /// True if any message delivered to `id` contains `fragment`.
    pub fn saw(&self, id: EntityId, fragment: &str) -> bool {
        self.texts_for(id).iter().any(|t| t.contains(fragment))
    }
}

impl Outbox for MemoryOutbox {
    fn deliver(&self, key: &str, message: &OutboundMessage) {
        self.messages
            .lock()
            .expect("outbox poisoned")
            .push((key.to_string(), message.clone()));
    }
}
