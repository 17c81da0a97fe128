//! Signaling relay events and commands.
//!
//! The signaling relay is a room-scoped pub/sub broker that never looks at
//! payloads. Events are named the way the relay emits them
//! (`introduction`, `newUserConnected`, `media:update`, ...) and carry their
//! arguments under `data`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Negotiation payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// An SDP blob plus its role, as produced by create-offer/create-answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

/// Body of a `signal` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalPayload {
    Offer { sdp: SessionDescription },
    Answer { sdp: SessionDescription },
    Candidate { candidate: IceCandidate },
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
        }
    }
}

// ---------------------------------------------------------------------------
// Media state
// ---------------------------------------------------------------------------

/// Announced microphone/camera enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    pub mic: bool,
    pub cam: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            mic: true,
            cam: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SignalingEvent {
    /// Transport-level connect acknowledgment carrying our relay-assigned ID.
    #[serde(rename = "connect")]
    Connected { id: String },

    /// Occupants already in the room when we joined.
    #[serde(rename = "introduction")]
    Introduction(Vec<String>),

    #[serde(rename = "newUserConnected")]
    NewUserConnected(String),

    #[serde(rename = "signal")]
    Signal {
        to: String,
        from: String,
        payload: SignalPayload,
    },

    #[serde(rename = "media:update")]
    MediaUpdate { id: String, mic: bool, cam: bool },

    #[serde(rename = "userDisconnected")]
    UserDisconnected(String),

    /// The signaling transport dropped.
    #[serde(rename = "disconnect")]
    TransportClosed,
}

impl SignalingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connect",
            Self::Introduction(_) => "introduction",
            Self::NewUserConnected(_) => "newUserConnected",
            Self::Signal { .. } => "signal",
            Self::MediaUpdate { .. } => "media:update",
            Self::UserDisconnected(_) => "userDisconnected",
            Self::TransportClosed => "disconnect",
        }
    }
}

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SignalingCommand {
    #[serde(rename = "join")]
    Join {
        name: String,
        #[serde(rename = "roomId")]
        room_id: String,
    },

    #[serde(rename = "signal")]
    Signal {
        to: String,
        from: String,
        payload: SignalPayload,
    },

    /// Broadcast to the rest of the room; the relay stamps our ID on it.
    #[serde(rename = "media:update")]
    MediaUpdate { mic: bool, cam: bool },
}
