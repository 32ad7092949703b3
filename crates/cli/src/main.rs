//! mudlark command line: run a world server, or talk to one.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use mudlark_content::{default_registry, world};
use mudlark_engine::OutboundMessage;
use mudlark_runtime::{WorldConfig, gateway, start};

#[derive(Parser)]
#[command(name = "mudlark")]
#[command(about = "A multiplayer text world", version)]
struct Cli {
    /// World directory (config.toml, snapshots/)
    #[arg(short = 'w', long, env = "MUDLARK_WORLD", default_value = "world")]
    world: PathBuf,

    /// Gateway address, for the client subcommands
    #[arg(
        short = 'z',
        long = "zone",
        env = "MUDLARK_ZONE",
        default_value = "127.0.0.1:4000"
    )]
    zone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the world server
    Run,

    /// Send one command as an entity
    Command {
        entity: u64,
        /// The command text, e.g. `look around`
        text: Vec<String>,
    },

    /// Stream an entity's messages to stdout
    Listen { entity: u64 },

    /// Interactive session: a prompt plus the live message stream
    Prompt { entity: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run => run(cli.world).await,
        Command::Command { entity, text } => send_command(&cli.zone, entity, &text.join(" ")).await,
        Command::Listen { entity } => listen(&cli.zone, entity, true).await,
        Command::Prompt { entity } => prompt(&cli.zone, entity).await,
    }
}

async fn run(world_dir: PathBuf) -> Result<()> {
    let config = WorldConfig::load(&world_dir)?;
    let registry = default_registry()?;

    let runtime = start(registry, &config, &world_dir, |zone| {
        let player = world::bootstrap(zone);
        tracing::info!(%player, "demo world created; connect with `mudlark prompt <id>`");
    })
    .await?;

    let listener = TcpListener::bind(&config.gateway.listen).await?;
    tracing::info!(addr = %config.gateway.listen, "gateway listening");
    let gateway_task = tokio::spawn(gateway::serve(listener, runtime.handle.clone()));

    let outcome = runtime.worker.await?;
    gateway_task.abort();
    runtime.ticker.abort();
    outcome?;
    Ok(())
}

async fn send_command(addr: &str, entity: u64, text: &str) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(format!("command {entity} {text}\n").as_bytes())
        .await?;
    let mut lines = BufReader::new(reader).lines();
    if let Some(line) = lines.next_line().await? {
        println!("{line}");
    }
    Ok(())
}

/// Streams an entity's messages, printing each message's text. With
/// `announce` set, prints the subscription acknowledgement too.
async fn listen(addr: &str, entity: u64, announce: bool) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(format!("listen {entity}\n").as_bytes())
        .await?;

    let mut lines = BufReader::new(reader).lines();
    let Some(ack) = lines.next_line().await? else {
        anyhow::bail!("connection closed before acknowledgement");
    };
    if ack != "ok" {
        anyhow::bail!("subscription refused: {ack}");
    }
    if announce {
        eprintln!("listening to entity {entity}");
    }

    while let Some(line) = lines.next_line().await? {
        match serde_json::from_str::<OutboundMessage>(&line) {
            Ok(message) => println!("{}", message.text()),
            Err(_) => println!("{line}"),
        }
    }
    Ok(())
}

async fn prompt(addr: &str, entity: u64) -> Result<()> {
    // Message stream in the background, prompt in the foreground.
    let listen_addr = addr.to_string();
    tokio::spawn(async move {
        if let Err(err) = listen(&listen_addr, entity, false).await {
            eprintln!("message stream ended: {err}");
        }
    });

    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut acks = BufReader::new(reader).lines();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("connected as entity {entity}; type commands, or `quit` to leave");
    while let Some(line) = stdin.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        writer
            .write_all(format!("command {entity} {line}\n").as_bytes())
            .await?;
        if let Some(ack) = acks.next_line().await?
            && ack != "ok"
        {
            eprintln!("{ack}");
        }
    }
    Ok(())
}
