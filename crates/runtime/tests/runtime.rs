//! End-to-end tests for the async shell: queue ordering, ticking, snapshot
//! lifecycle, and the TCP gateway.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use mudlark_content::{Bird, Positioned, default_registry, world};
use mudlark_engine::{EntityId, EntityRecord, Mode, OutboundMessage, ZoneSnapshot};
use mudlark_runtime::{Runtime, RuntimeError, SnapshotStore, WorldConfig, gateway, start};

fn test_config(tick_ms: u64) -> WorldConfig {
    let mut config = WorldConfig::default();
    config.zone.seed = Some(1);
    config.zone.tick_ms = tick_ms;
    config
}

async fn start_bootstrap_world(dir: &Path, tick_ms: u64) -> (Runtime, EntityId) {
    let mut player = None;
    let runtime = start(
        default_registry().unwrap(),
        &test_config(tick_ms),
        dir,
        |zone| player = Some(world::bootstrap(zone)),
    )
    .await
    .unwrap();
    (runtime, player.expect("fresh world"))
}

async fn next_text(
    rx: &mut tokio::sync::broadcast::Receiver<OutboundMessage>,
) -> Option<String> {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .ok()?
        .ok()
        .map(|m| m.text().to_string())
}

#[tokio::test]
async fn commands_are_processed_in_fifo_order() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, player) = start_bootstrap_world(dir.path(), 0).await;
    let mut rx = runtime.handle.listen(player);

    for text in ["say one", "say two", "say three"] {
        runtime.handle.enqueue_command(player, text).await.unwrap();
    }
    runtime.handle.stop().await.unwrap();
    runtime.worker.await.unwrap().unwrap();

    let mut seen = Vec::new();
    while let Ok(message) = rx.try_recv() {
        seen.push(message.text().to_string());
    }
    let says: Vec<&str> = seen
        .iter()
        .map(String::as_str)
        .filter(|t| t.starts_with("You say"))
        .collect();
    assert_eq!(
        says,
        [
            r#"You say: "One.""#,
            r#"You say: "Two.""#,
            r#"You say: "Three.""#,
        ]
    );
}

#[tokio::test]
async fn ticker_drives_ticking_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = None;
    let runtime = start(
        default_registry().unwrap(),
        &test_config(10),
        dir.path(),
        |zone| {
            let room = zone.spawn("a room", "A room.");
            zone.attach(room, Box::new(Positioned::new().container()));
            let p = world::create_player(zone, "Player", room);
            let pigeon = zone.spawn("a pigeon", "Scruffy.");
            zone.attach(pigeon, Box::new(Positioned::new().inside(room)));
            zone.attach(pigeon, Box::new(Bird::new(1.0)));
            player = Some(p);
        },
    )
    .await
    .unwrap();
    let player = player.unwrap();
    let mut rx = runtime.handle.listen(player);

    let heard = loop {
        match next_text(&mut rx).await {
            Some(text) if text.contains("A pigeon") => break true,
            Some(_) => continue,
            None => break false,
        }
    };
    assert!(heard);

    runtime.handle.stop().await.unwrap();
    runtime.worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn graceful_halt_saves_a_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, player) = start_bootstrap_world(dir.path(), 0).await;

    runtime.handle.enqueue_command(player, "halt").await.unwrap();
    runtime.worker.await.unwrap().unwrap();

    let store = SnapshotStore::for_zone(dir.path(), "default");
    let snapshot = store.load().unwrap().expect("snapshot written on halt");
    assert!(snapshot.entities.iter().any(|e| e.id == player));
}

#[tokio::test]
async fn handler_errors_save_a_snapshot_and_surface() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, player) = start_bootstrap_world(dir.path(), 0).await;

    runtime
        .handle
        .enqueue_command(player, "crash")
        .await
        .unwrap();
    let outcome = runtime.worker.await.unwrap();
    assert!(matches!(outcome, Err(RuntimeError::Engine(_))));

    assert!(SnapshotStore::for_zone(dir.path(), "default").exists());
}

#[tokio::test]
async fn restart_restores_world_state_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, player) = start_bootstrap_world(dir.path(), 0).await;
    runtime
        .handle
        .enqueue_command(player, "take ball")
        .await
        .unwrap();
    runtime.handle.enqueue_command(player, "halt").await.unwrap();
    runtime.worker.await.unwrap().unwrap();

    // Second boot must restore from the snapshot, not re-initialize.
    let mut initialized = false;
    let runtime = start(
        default_registry().unwrap(),
        &test_config(0),
        dir.path(),
        |_| initialized = true,
    )
    .await
    .unwrap();
    assert!(!initialized);

    let mut rx = runtime.handle.listen(player);
    runtime.handle.enqueue_command(player, "i").await.unwrap();

    let mut saw_ball = false;
    for _ in 0..10 {
        match next_text(&mut rx).await {
            Some(text) => {
                if text.contains("a rubber ball") {
                    saw_ball = true;
                    break;
                }
            }
            None => break,
        }
    }
    assert!(saw_ball);

    runtime.handle.stop().await.unwrap();
    runtime.worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_capabilities_in_a_snapshot_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::for_zone(dir.path(), "default");
    store
        .save(&ZoneSnapshot {
            entities: vec![EntityRecord {
                id: EntityId(1),
                name: "a relic".into(),
                desc: "Old.".into(),
                hearing: true,
                mode: Some(Mode::Action),
                components: std::collections::BTreeMap::from([(
                    "Mystery".to_string(),
                    serde_json::json!({}),
                )]),
            }],
        })
        .unwrap();

    let runtime = start(
        default_registry().unwrap(),
        &test_config(0),
        dir.path(),
        |_| {},
    )
    .await
    .unwrap();

    // The entity loaded without its unknown capability and still responds.
    let relic = EntityId(1);
    let mut rx = runtime.handle.listen(relic);
    runtime.handle.enqueue_command(relic, "ping").await.unwrap();
    assert_eq!(
        next_text(&mut rx).await.as_deref(),
        Some("You're unable to do that.")
    );

    runtime.handle.stop().await.unwrap();
    runtime.worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn gateway_accepts_commands_and_streams_messages() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, player) = start_bootstrap_world(dir.path(), 0).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gateway_handle = runtime.handle.clone();
    tokio::spawn(async move {
        let _ = gateway::serve(listener, gateway_handle).await;
    });

    // Dedicated listening connection.
    let mut listen_conn = BufReader::new(TcpStream::connect(addr).await.unwrap());
    listen_conn
        .get_mut()
        .write_all(format!("listen {player}\n").as_bytes())
        .await
        .unwrap();
    let mut line = String::new();
    listen_conn.read_line(&mut line).await.unwrap();
    assert_eq!(line.trim(), "ok");

    // Command connection.
    let mut command_conn = BufReader::new(TcpStream::connect(addr).await.unwrap());
    command_conn
        .get_mut()
        .write_all(format!("command {player} ping\n").as_bytes())
        .await
        .unwrap();
    line.clear();
    command_conn.read_line(&mut line).await.unwrap();
    assert_eq!(line.trim(), "ok");

    // The reply arrives on the listening connection as a JSON line.
    line.clear();
    timeout(Duration::from_secs(5), listen_conn.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    let message: OutboundMessage = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(message.text(), "Pong!");

    // Malformed requests get an error line, not a dropped connection.
    command_conn
        .get_mut()
        .write_all(b"command notanid hello\n")
        .await
        .unwrap();
    line.clear();
    command_conn.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("error"));

    runtime.handle.stop().await.unwrap();
    runtime.worker.await.unwrap().unwrap();
}
