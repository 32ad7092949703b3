//! Async shell around a [`mudlark_engine::Zone`].
//!
//! The engine core is synchronous and single-writer; this crate supplies
//! the plumbing around it: a worker task that owns the zone and drains one
//! MPSC queue, a ticker that feeds that queue, a broadcast message bus for
//! outbound delivery, snapshot persistence, and a line-based TCP gateway.

pub mod bus;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod snapshot;
pub mod ticker;
pub mod worker;

pub use bus::MessageBus;
pub use config::{GatewayConfig, WorldConfig, ZoneConfig};
pub use error::{Result, RuntimeError};
pub use handle::ZoneHandle;
pub use snapshot::SnapshotStore;
pub use ticker::spawn_ticker;
pub use worker::{ZoneInput, ZoneWorker};

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mudlark_engine::{Outbox, Registry, Zone};

const INPUT_QUEUE_DEPTH: usize = 256;

/// A started zone: the handle for feeding it, plus the background tasks.
pub struct Runtime {
    pub handle: ZoneHandle,
    /// Resolves when the zone halts: `Ok` on graceful stop, `Err` after a
    /// handler failure (the snapshot has been saved either way).
    pub worker: JoinHandle<Result<()>>,
    pub ticker: JoinHandle<()>,
}

/// Builds the zone, restores its snapshot (or initializes a fresh world via
/// `init`), and spawns the worker and ticker.
pub async fn start(
    registry: Arc<Registry>,
    config: &WorldConfig,
    world_dir: &Path,
    init: impl FnOnce(&mut Zone),
) -> Result<Runtime> {
    let bus = MessageBus::new();
    let store = SnapshotStore::for_zone(world_dir, &config.zone.name);
    let outbox: Arc<dyn Outbox> = Arc::new(bus.clone());

    let mut zone = match config.zone.seed {
        Some(seed) => Zone::with_seed(registry, outbox, seed),
        None => Zone::new(registry, outbox),
    };

    let loader = store.clone();
    match tokio::task::spawn_blocking(move || loader.load()).await?? {
        Some(snapshot) => {
            let entities = snapshot.entities.len();
            zone.load_snapshot(snapshot)?;
            tracing::info!(zone = %config.zone.name, entities, "snapshot restored");
        }
        None => {
            init(&mut zone);
            tracing::info!(zone = %config.zone.name, "fresh world initialized");
        }
    }

    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    let handle = ZoneHandle::new(input_tx, bus);
    let worker = tokio::spawn(ZoneWorker::new(zone, input_rx, store).run());
    let ticker = spawn_ticker(handle.clone(), config.tick_interval());

    Ok(Runtime {
        handle,
        worker,
        ticker,
    })
}
