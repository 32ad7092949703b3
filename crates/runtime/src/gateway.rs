//! Line-based TCP gateway.
//!
//! Protocol, one request per line:
//!
//! ```text
//! command <entity_id> <text>   queue player input; replies "ok" or "error ..."
//! listen <entity_id>           switch the connection into a message stream;
//!                              each outbound message is one JSON line
//! ```

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use mudlark_engine::EntityId;

use crate::error::{Result, RuntimeError};
use crate::handle::ZoneHandle;

/// Accept loop. Runs until the listener fails.
pub async fn serve(listener: TcpListener, handle: ZoneHandle) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.map_err(RuntimeError::Gateway)?;
        tracing::debug!(%peer, "client connected");
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_client(stream, handle).await {
                tracing::debug!(%peer, error = %err, "client session ended");
            }
        });
    }
}

async fn serve_client(stream: TcpStream, handle: ZoneHandle) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await.map_err(RuntimeError::Gateway)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        match verb {
            "command" => {
                let Some((id, text)) = rest.split_once(' ') else {
                    reply(&mut writer, "error usage: command <entity_id> <text>").await?;
                    continue;
                };
                let Ok(raw) = id.parse::<u64>() else {
                    reply(&mut writer, "error bad entity id").await?;
                    continue;
                };
                handle.enqueue_command(EntityId(raw), text).await?;
                reply(&mut writer, "ok").await?;
            }
            "listen" => {
                let Ok(raw) = rest.trim().parse::<u64>() else {
                    reply(&mut writer, "error usage: listen <entity_id>").await?;
                    continue;
                };
                let rx = handle.listen(EntityId(raw));
                reply(&mut writer, "ok").await?;
                // The connection is a message stream from here on.
                return stream_messages(rx, writer).await;
            }
            _ => reply(&mut writer, "error unknown verb").await?,
        }
    }
    Ok(())
}

async fn stream_messages(
    mut rx: broadcast::Receiver<mudlark_engine::OutboundMessage>,
    mut writer: OwnedWriteHalf,
) -> Result<()> {
    loop {
        match rx.recv().await {
            Ok(message) => {
                let json = serde_json::to_string(&message)?;
                reply(&mut writer, &json).await?;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "listener lagged; messages dropped");
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

async fn reply(writer: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    writer
        .write_all(format!("{line}\n").as_bytes())
        .await
        .map_err(RuntimeError::Gateway)
}
