//! Chat relay client.
//!
//! One background task owns the WebSocket. The [`ChatClient`] handle sends
//! commands to it; everything the relay says comes back as [`ChatEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use meet_common::{new_member_id, ChatMessage, ClientFrame, RelayFrame, TransportError};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;

/// Shown locally when a message is sent while the relay is unreachable.
pub const NOT_CONNECTED_NOTICE: &str = "Chat not connected. Try again in a moment.";

const CONNECT_FAILED_NOTICE: &str = "Could not connect to chat";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Who we are in the chat room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatIdentity {
    pub user_id: String,
    pub name: String,
    pub room_id: String,
}

impl ChatIdentity {
    pub fn new(name: &str, room_id: &str) -> Self {
        Self {
            user_id: new_member_id(),
            name: name.to_string(),
            room_id: room_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Connected,
    Message(ChatMessage),
    Typing { user_id: String, user_name: String },
    Disconnected,
}

enum ChatCommand {
    Send(ClientFrame),
    Close,
}

pub struct ChatClient {
    command_tx: mpsc::Sender<ChatCommand>,
    event_tx: mpsc::Sender<ChatEvent>,
    connected: Arc<RwLock<bool>>,
}

impl ChatClient {
    /// Start the background connection. The join frame goes out as soon as
    /// the socket opens. Returns `(client, event_receiver)`.
    pub fn connect(url: &str, identity: ChatIdentity) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let connected = Arc::new(RwLock::new(false));

        tokio::spawn(connection_task(
            url.to_string(),
            identity,
            Arc::clone(&connected),
            event_tx.clone(),
            command_rx,
        ));

        let client = Self {
            command_tx,
            event_tx,
            connected,
        };
        (client, event_rx)
    }

    /// Connect to the chat relay named in the session config.
    pub fn from_config(
        config: &SessionConfig,
        identity: ChatIdentity,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        Self::connect(&config.chat_url, identity)
    }

    /// Send a chat message. Blank text is ignored. While disconnected a
    /// local system notice is emitted instead.
    pub async fn send_message(&self, text: &str) -> Result<(), TransportError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if !self.is_connected().await {
            let notice = ChatEvent::Message(ChatMessage::system(NOT_CONNECTED_NOTICE));
            let _ = self.event_tx.send(notice).await;
            return Err(TransportError::Closed);
        }
        self.command(ChatCommand::Send(ClientFrame::Message {
            text: text.to_string(),
        }))
        .await
    }

    pub async fn send_typing(&self) -> Result<(), TransportError> {
        if !self.is_connected().await {
            return Err(TransportError::Closed);
        }
        self.command(ChatCommand::Send(ClientFrame::Typing)).await
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    pub async fn disconnect(&self) {
        let _ = self.command(ChatCommand::Close).await;
    }

    async fn command(&self, command: ChatCommand) -> Result<(), TransportError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

async fn connection_task(
    url: String,
    identity: ChatIdentity,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<ChatEvent>,
    mut command_rx: mpsc::Receiver<ChatCommand>,
) {
    info!(url = %url, room = %identity.room_id, "Connecting to chat relay");

    let ws = match tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(&url))
        .await
    {
        Ok(Ok((ws, _))) => ws,
        Ok(Err(e)) => {
            warn!(error = %e, "Chat connection failed");
            connect_failed(&event_tx).await;
            return;
        }
        Err(_elapsed) => {
            warn!("Chat connection timed out after 15s");
            connect_failed(&event_tx).await;
            return;
        }
    };

    let (mut sink, mut stream) = ws.split();

    let join = ClientFrame::Join {
        user_id: Some(identity.user_id.clone()),
        name: identity.name.clone(),
        room_id: identity.room_id.clone(),
    };
    if send_frame(&mut sink, &join).await {
        *connected.write().await = true;
        let _ = event_tx.send(ChatEvent::Connected).await;

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(ChatCommand::Send(frame)) => {
                        if !send_frame(&mut sink, &frame).await {
                            break;
                        }
                    }
                    Some(ChatCommand::Close) | None => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        break;
                    }
                },

                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => relay_frame(text.as_str(), &event_tx).await,
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Chat relay closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Chat WebSocket error");
                        break;
                    }
                    _ => {}
                },
            }
        }
    }

    *connected.write().await = false;
    let _ = event_tx.send(ChatEvent::Disconnected).await;
}

async fn connect_failed(event_tx: &mpsc::Sender<ChatEvent>) {
    let notice = ChatEvent::Message(ChatMessage::system(CONNECT_FAILED_NOTICE));
    let _ = event_tx.send(notice).await;
    let _ = event_tx.send(ChatEvent::Disconnected).await;
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame) -> bool
where
    S: Sink<WsMessage> + Unpin,
{
    match frame.to_json() {
        Ok(json) => sink.send(WsMessage::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Dropping unserializable chat frame");
            true
        }
    }
}

/// Frames that fail to parse are dropped.
async fn relay_frame(text: &str, event_tx: &mpsc::Sender<ChatEvent>) {
    let frame = match serde_json::from_str::<RelayFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable chat frame");
            return;
        }
    };
    let event = match frame {
        RelayFrame::Typing { user_id, user_name } => ChatEvent::Typing { user_id, user_name },
        other => match other.into_chat_message() {
            Some(msg) => ChatEvent::Message(msg),
            None => return,
        },
    };
    let _ = event_tx.send(event).await;
}
