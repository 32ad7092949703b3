//! Per-key outbound message fan-out.
//!
//! One broadcast channel per channel key (`entity:<id>:messages`), created
//! lazily on first subscription. Publishing to a key with no subscribers is
//! a no-op: delivery is best-effort, and slow subscribers that lag are
//! dropped by the broadcast channel rather than backpressuring the zone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use mudlark_engine::{Outbox, OutboundMessage};

const DEFAULT_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct MessageBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<OutboundMessage>>>>,
    capacity: usize,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Subscribes to a channel key, creating the channel if needed.
    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<OutboundMessage> {
        let mut channels = self.channels.write().expect("bus poisoned");
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn publish(&self, key: &str, message: OutboundMessage) {
        let channels = self.channels.read().expect("bus poisoned");
        match channels.get(key) {
            Some(tx) => {
                if tx.send(message).is_err() {
                    tracing::trace!(key, "no live subscribers");
                }
            }
            None => tracing::trace!(key, "no channel for key"),
        }
    }
}

impl Outbox for MessageBus {
    fn deliver(&self, key: &str, message: &OutboundMessage) {
        self.publish(key, message.clone());
    }
}
