//! meet-relay: room-scoped chat relay for eisc-meet.
//!
//! Accepts WebSocket connections, places them in rooms on `join`, and
//! broadcasts chat, system and typing frames to the other members of the
//! room. Nothing is persisted: a room lives as long as it has members.

mod connection;
mod registry;
mod relay;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use meet_config::MeetConfig;
use meet_common::ConfigError;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;
use crate::registry::ConnId;
use crate::relay::ChatRelay;

#[derive(Parser)]
#[command(name = "meet-relay", about = "Room-scoped chat relay for eisc-meet")]
struct Args {
    /// Port to listen on. Overrides the config file.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Path to a TOML config file. Defaults to the platform config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load(args: &Args) -> Result<MeetConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => meet_config::load_config_from(path)?,
        None => meet_config::load_config()?,
    };
    if let Some(port) = args.port {
        config.relay.port = port;
    }
    meet_config::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let loaded = load(&args);

    let default_filter = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "meet_relay=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let addr = config.relay.listen_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("meet-relay listening on ws://{}", addr);

    let (relay_tx, relay_rx) = mpsc::channel(1024);
    let relay_task = tokio::spawn(ChatRelay::new().run(relay_rx));

    let capacity = config.relay.channel_capacity;
    let mut next_conn: ConnId = 1;

    // Accept loop.
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let conn = next_conn;
                    next_conn += 1;
                    let relay_tx = relay_tx.clone();
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => handle_connection(ws, peer, conn, relay_tx, capacity).await,
                            Err(e) => {
                                tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    drop(relay_tx);
    relay_task.abort();
    ExitCode::SUCCESS
}
