//! Client side of an eisc-meet session.
//!
//! A session joins a room on the signaling relay, keeps one peer connection
//! per other occupant (full mesh), and announces local mic/camera state.
//! Chat runs separately over the chat relay.
//!
//! The WebRTC stack, the capture devices and the signaling socket are
//! supplied by the host through the traits in [`peer`], [`media`] and
//! [`signaling`].

pub mod chat;
pub mod config;
pub mod driver;
pub mod media;
pub mod peer;
pub mod protocol;
pub mod signaling;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat::{ChatClient, ChatEvent, ChatIdentity, ChatLog};
pub use config::SessionConfig;
pub use driver::{run_session, spawn_session, SessionHandle, SessionInbox, SessionInput};
pub use media::{LocalStream, LocalTrack, MediaCapture, MediaStateSync, TrackKind};
pub use peer::{
    PeerConnection, PeerConnectionFactory, PeerConnectionTable, PeerEntry, PeerNotifier,
    PeerPhase,
};
pub use protocol::{
    IceCandidate, MediaState, SdpType, SessionDescription, SignalPayload, SignalingCommand,
    SignalingEvent,
};
pub use signaling::{SessionPhase, SignalingOrchestrator, SignalingTransport};
