//! The zone worker: single consumer of the merged input queue.
//!
//! Commands, ticks, and stop markers from every producer are serialized
//! through one MPSC channel, so the worker processes them strictly in
//! arrival order and the zone never sees concurrent mutation.

use tokio::sync::mpsc;

use mudlark_engine::{EntityId, Zone};

use crate::error::Result;
use crate::snapshot::SnapshotStore;

/// One unit of work for the zone.
pub enum ZoneInput {
    Command { entity: EntityId, text: String },
    Tick,
    Stop,
}

pub struct ZoneWorker {
    zone: Zone,
    input_rx: mpsc::Receiver<ZoneInput>,
    store: SnapshotStore,
}

impl ZoneWorker {
    pub fn new(zone: Zone, input_rx: mpsc::Receiver<ZoneInput>, store: SnapshotStore) -> Self {
        Self {
            zone,
            input_rx,
            store,
        }
    }

    /// Processes queue items until the zone stops, a handler fails, or every
    /// producer hangs up. Every exit path persists a snapshot first; a
    /// handler error is returned to the caller after the snapshot lands.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!("zone worker started");
        let outcome = self.pump().await;
        if let Err(err) = &outcome {
            tracing::error!(error = %err, "handler failed; halting zone");
        }
        if let Err(err) = self.save_snapshot().await {
            tracing::error!(error = %err, "exit snapshot failed");
            outcome?;
            return Err(err);
        }
        tracing::info!("zone worker stopped");
        outcome
    }

    async fn pump(&mut self) -> Result<()> {
        while let Some(input) = self.input_rx.recv().await {
            match input {
                ZoneInput::Command { entity, text } => self.zone.perform(entity, &text)?,
                ZoneInput::Tick => self.zone.perform_tick()?,
                ZoneInput::Stop => self.zone.stop(),
            }
            if self.zone.take_snapshot_request() {
                self.save_snapshot().await?;
            }
            if !self.zone.is_running() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Copies the zone into plain records synchronously, then hands the
    /// write to the blocking pool so disk latency never stalls the queue.
    async fn save_snapshot(&self) -> Result<()> {
        let snapshot = self.zone.to_snapshot()?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.save(&snapshot)).await??;
        Ok(())
    }
}
