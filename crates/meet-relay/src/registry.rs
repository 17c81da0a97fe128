//! Room registry: maps room IDs to their current members.
//!
//! Rooms are created on first join and destroyed when the last member
//! leaves. All mutation goes through `RoomRegistry` methods, which are only
//! called from the relay task, so no locking is needed here.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info};

/// Relay-assigned identifier for one WebSocket connection.
pub type ConnId = u64;

/// A member of a room and the outbound channel of the connection that
/// registered it.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub conn: ConnId,
    tx: mpsc::Sender<String>,
}

impl Member {
    pub fn new(id: String, name: String, conn: ConnId, tx: mpsc::Sender<String>) -> Self {
        Self { id, name, conn, tx }
    }

    /// Queue a frame. Closed or saturated channels are skipped.
    pub fn deliver(&self, frame: &str) -> bool {
        match self.tx.try_send(frame.to_string()) {
            Ok(()) => true,
            Err(e) => {
                debug!(member = %self.id, conn = self.conn, error = %e, "Skipping delivery");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct Room {
    pub id: String,
    members: HashMap<String, Member>,
}

impl Room {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            members: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.get(member_id)
    }
}

/// Result of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_created: bool,
    /// Another connection held this member ID and was overwritten.
    pub replaced: bool,
}

/// Result of a leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member was not registered under this connection.
    NotMember,
    Left {
        name: String,
        remaining: usize,
        room_destroyed: bool,
    },
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, creating the room if needed. A colliding member ID
    /// is overwritten (last write wins).
    pub fn join(&mut self, room_id: &str, member: Member) -> JoinOutcome {
        let room_created = !self.rooms.contains_key(room_id);
        let room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id));

        let replaced = match room.members.insert(member.id.clone(), member) {
            Some(old) => {
                debug!(room = %room_id, member = %old.id, conn = old.conn, "Member ID overwritten");
                true
            }
            None => false,
        };

        if room_created {
            info!(room = %room_id, "Room created");
        }
        debug!(room = %room_id, members = room.len(), "Member joined");

        JoinOutcome {
            room_created,
            replaced,
        }
    }

    /// Remove a member registered by `conn`. Destroys the room if it empties.
    ///
    /// A member whose ID has since been taken over by another connection is
    /// left in place.
    pub fn leave(&mut self, room_id: &str, member_id: &str, conn: ConnId) -> LeaveOutcome {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return LeaveOutcome::NotMember;
        };
        if room.member(member_id).map(|m| m.conn) != Some(conn) {
            return LeaveOutcome::NotMember;
        }
        let name = room
            .members
            .remove(member_id)
            .map(|m| m.name)
            .unwrap_or_default();

        let remaining = room.len();
        let room_destroyed = remaining == 0;
        if room_destroyed {
            self.rooms.remove(room_id);
            info!(room = %room_id, "Room destroyed (empty)");
        }

        LeaveOutcome::Left {
            name,
            remaining,
            room_destroyed,
        }
    }

    /// Deliver a frame to every member of a room except `exclude`.
    /// Returns the number of channels that accepted it.
    pub fn broadcast(&self, room_id: &str, frame: &str, exclude: Option<&str>) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            return 0;
        };
        room.members
            .values()
            .filter(|m| exclude != Some(m.id.as_str()))
            .filter(|m| m.deliver(frame))
            .count()
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, Room::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
