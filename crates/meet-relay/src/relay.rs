//! Chat relay: applies client frames to the room registry and fans out
//! the resulting relay frames.
//!
//! Every connection task forwards its events into a single `ChatRelay`
//! task, which handles them one at a time. Handlers never fail: bad input
//! is logged and dropped without touching registry state.

use std::collections::HashMap;

use meet_common::{new_member_id, ChatMessage, ClientFrame, ProtocolError, RelayFrame};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{ConnId, LeaveOutcome, Member, RoomRegistry};

/// Events delivered to the relay task by connection handlers.
#[derive(Debug)]
pub enum RelayInput {
    Connected {
        conn: ConnId,
        tx: mpsc::Sender<String>,
    },
    Frame {
        conn: ConnId,
        text: String,
    },
    Closed {
        conn: ConnId,
    },
}

/// Room membership established by a connection's `join` frame.
#[derive(Debug, Clone)]
struct Binding {
    room_id: String,
    member_id: String,
    name: String,
}

struct Connection {
    tx: mpsc::Sender<String>,
    binding: Option<Binding>,
}

pub struct ChatRelay {
    registry: RoomRegistry,
    connections: HashMap<ConnId, Connection>,
}

impl ChatRelay {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
            connections: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Process inputs until every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RelayInput>) {
        while let Some(input) = rx.recv().await {
            self.handle(input);
        }
        debug!("Relay input channel closed");
    }

    pub fn handle(&mut self, input: RelayInput) {
        match input {
            RelayInput::Connected { conn, tx } => {
                self.connections.insert(conn, Connection { tx, binding: None });
            }
            RelayInput::Frame { conn, text } => self.on_frame(conn, &text),
            RelayInput::Closed { conn } => self.on_closed(conn),
        }
    }

    fn on_frame(&mut self, conn: ConnId, text: &str) {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn, error = %e, "Dropping client frame");
                return;
            }
        };

        let result = match frame {
            ClientFrame::Join {
                user_id,
                name,
                room_id,
            } => self.join(conn, user_id, name, room_id),
            ClientFrame::Message { text } => self.message(conn, text),
            ClientFrame::Typing => self.typing(conn),
        };

        if let Err(e) = result {
            debug!(conn, error = %e, "Ignoring client frame");
        }
    }

    fn join(
        &mut self,
        conn: ConnId,
        user_id: Option<String>,
        name: String,
        room_id: String,
    ) -> Result<(), ProtocolError> {
        if room_id.trim().is_empty() {
            return Err(ProtocolError::Malformed("empty roomId".into()));
        }
        let tx = match self.connections.get(&conn) {
            Some(c) => c.tx.clone(),
            None => return Err(ProtocolError::Malformed("unregistered connection".into())),
        };

        // Switching rooms on the same channel leaves the old one first.
        self.unbind(conn);

        let member_id = user_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(new_member_id);
        let member = Member::new(member_id.clone(), name.clone(), conn, tx.clone());
        self.registry.join(&room_id, member);

        info!(
            conn,
            room = %room_id,
            member = %member_id,
            total = self.registry.member_count(&room_id),
            "{name} joined"
        );

        let welcome = RelayFrame::system(format!("Welcome {name} to room {room_id}")).to_json()?;
        if tx.try_send(welcome).is_err() {
            debug!(conn, "Joining channel not writable; welcome skipped");
        }

        let joined = RelayFrame::system(format!("{name} joined the room")).to_json()?;
        self.registry
            .broadcast(&room_id, &joined, Some(member_id.as_str()));

        if let Some(c) = self.connections.get_mut(&conn) {
            c.binding = Some(Binding {
                room_id,
                member_id,
                name,
            });
        }
        Ok(())
    }

    fn message(&mut self, conn: ConnId, text: String) -> Result<(), ProtocolError> {
        let binding = self.binding(conn)?;
        debug!(room = %binding.room_id, sender = %binding.name, "Chat message");

        let msg = ChatMessage::user(binding.name.clone(), text);
        let frame = RelayFrame::from(&msg).to_json()?;
        // Sender-inclusive: the sender's own copy is its local echo.
        self.registry.broadcast(&binding.room_id, &frame, None);
        Ok(())
    }

    fn typing(&mut self, conn: ConnId) -> Result<(), ProtocolError> {
        let binding = self.binding(conn)?;
        let frame = RelayFrame::Typing {
            user_id: binding.member_id.clone(),
            user_name: binding.name.clone(),
        }
        .to_json()?;
        self.registry
            .broadcast(&binding.room_id, &frame, Some(binding.member_id.as_str()));
        Ok(())
    }

    fn on_closed(&mut self, conn: ConnId) {
        self.unbind(conn);
        self.connections.remove(&conn);
        debug!(conn, "Connection released");
    }

    /// Remove the connection's membership, announcing the departure if
    /// the room survives.
    fn unbind(&mut self, conn: ConnId) {
        let Some(binding) = self.connections.get_mut(&conn).and_then(|c| c.binding.take()) else {
            return;
        };

        match self
            .registry
            .leave(&binding.room_id, &binding.member_id, conn)
        {
            LeaveOutcome::Left {
                name,
                remaining,
                room_destroyed,
            } => {
                info!(conn, room = %binding.room_id, total = remaining, "{name} left");
                if !room_destroyed {
                    match RelayFrame::system(format!("{name} left the room")).to_json() {
                        Ok(frame) => {
                            self.registry.broadcast(&binding.room_id, &frame, None);
                        }
                        Err(e) => warn!(error = %e, "Failed to encode leave notice"),
                    }
                }
            }
            LeaveOutcome::NotMember => {
                debug!(conn, member = %binding.member_id, "Member already replaced");
            }
        }
    }

    fn binding(&self, conn: ConnId) -> Result<Binding, ProtocolError> {
        self.connections
            .get(&conn)
            .and_then(|c| c.binding.clone())
            .ok_or(ProtocolError::NotJoined)
    }
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self::new()
    }
}
