//! Cloneable façade for feeding a running zone and listening to it.

use tokio::sync::{broadcast, mpsc};

use mudlark_engine::{EntityId, OutboundMessage, messages_key};

use crate::bus::MessageBus;
use crate::error::{Result, RuntimeError};
use crate::worker::ZoneInput;

/// Client-facing handle to a zone worker. Cheap to clone; every producer
/// feeds the same FIFO queue.
#[derive(Clone)]
pub struct ZoneHandle {
    input_tx: mpsc::Sender<ZoneInput>,
    bus: MessageBus,
}

impl ZoneHandle {
    pub(crate) fn new(input_tx: mpsc::Sender<ZoneInput>, bus: MessageBus) -> Self {
        Self { input_tx, bus }
    }

    /// Queues raw player input for an entity.
    pub async fn enqueue_command(&self, entity: EntityId, text: impl Into<String>) -> Result<()> {
        self.input_tx
            .send(ZoneInput::Command {
                entity,
                text: text.into(),
            })
            .await
            .map_err(|_| RuntimeError::WorkerClosed)
    }

    /// Queues a tick marker.
    pub async fn enqueue_tick(&self) -> Result<()> {
        self.input_tx
            .send(ZoneInput::Tick)
            .await
            .map_err(|_| RuntimeError::WorkerClosed)
    }

    /// Asks the worker to stop after the events already queued.
    pub async fn stop(&self) -> Result<()> {
        self.input_tx
            .send(ZoneInput::Stop)
            .await
            .map_err(|_| RuntimeError::WorkerClosed)
    }

    /// Subscribes to an entity's outbound messages.
    pub fn listen(&self, entity: EntityId) -> broadcast::Receiver<OutboundMessage> {
        self.bus.subscribe(&messages_key(entity))
    }
}
