use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use huddle::client::{
    PeerSession, ReceiveOnlyCapture, RelayConnection, SessionCommand, SessionConfig,
    WebRtcConnector,
};
use huddle::model::IceServerConfig;
use huddle::server::{RelayConfig, RelayService};
use huddle::{RoomId, SessionId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Peer-to-peer group calls with a lightweight signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        /// STUN server handed to clients. Repeatable.
        #[arg(long = "stun")]
        stun: Vec<String>,
    },

    /// Ask a relay for a fresh room id.
    CreateRoom {
        #[arg(long, env = "HUDDLE_SERVER", default_value = "ws://127.0.0.1:5000")]
        server: String,
    },

    /// Join a room as a receive-only participant. Lines on stdin are sent
    /// as chat; `/mute` and `/video` toggle local media; `/leave` or end of
    /// input leaves.
    Join {
        #[arg(long, env = "HUDDLE_SERVER", default_value = "ws://127.0.0.1:5000")]
        server: String,

        #[arg(long)]
        room: RoomId,

        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind, stun } => serve(bind, stun).await,
        Commands::CreateRoom { server } => create_room(&server).await,
        Commands::Join { server, room, name } => join(&server, room, name).await,
    }
}

async fn serve(bind: SocketAddr, stun: Vec<String>) -> Result<()> {
    let mut config = RelayConfig::default();
    if !stun.is_empty() {
        config.ice_servers = stun.into_iter().map(IceServerConfig::stun).collect();
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    println!(
        "{} {}",
        "📡 Huddle relay on".green().bold(),
        listener.local_addr()?.to_string().cyan()
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    };
    huddle::server::serve(listener, RelayService::new(config), shutdown).await
}

async fn create_room(server: &str) -> Result<()> {
    let mut relay = RelayConnection::connect(server, SessionId::new())
        .await
        .with_context(|| format!("Failed to reach relay at {}", server))?;
    let room_id = relay
        .create_room()
        .await
        .context("Relay did not create a room")?;

    relay.close().await;

    println!("{} {}", "✨ Room created:".green().bold(), room_id);
    Ok(())
}

async fn join(server: &str, room_id: RoomId, display_name: String) -> Result<()> {
    let session_id = SessionId::new();
    let relay = RelayConnection::connect(server, session_id)
        .await
        .with_context(|| format!("Failed to reach relay at {}", server))?;
    let parts = relay.into_parts();

    let config = SessionConfig {
        room_id,
        session_id,
        display_name,
    };
    let connector = Arc::new(WebRtcConnector::default());
    let (session, link_events) =
        PeerSession::join(config, &ReceiveOnlyCapture, connector, parts.outbound)
            .await
            .context("Failed to join room")?;

    println!(
        "{} {} {}",
        "🚀 Joined room".green().bold(),
        room_id.to_string().cyan(),
        "(type to chat, /leave to quit)".dimmed()
    );

    let (command_tx, command_rx) = mpsc::channel(16);
    let mut session_task = tokio::spawn(session.run(link_events, parts.inbound, command_rx));
    let mut session_ended = false;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let command = match line? {
                    Some(line) if line.trim() == "/leave" => break,
                    Some(line) if line.trim() == "/mute" => SessionCommand::ToggleAudio,
                    Some(line) if line.trim() == "/video" => SessionCommand::ToggleVideo,
                    Some(line) => SessionCommand::SendChat(line),
                    None => break,
                };
                if command_tx.send(command).await.is_err() {
                    warn!("Session already ended");
                    break;
                }
            }
            result = &mut session_task => {
                result.context("Session task panicked")?;
                session_ended = true;
                break;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if !session_ended {
        let _ = command_tx.send(SessionCommand::Leave).await;
        session_task.await.context("Session task panicked")?;
    }
    if tokio::time::timeout(FLUSH_TIMEOUT, parts.writer).await.is_err() {
        warn!("Relay did not take the leave in time");
    }

    println!("{}", "👋 Left the room".yellow());
    Ok(())
}
