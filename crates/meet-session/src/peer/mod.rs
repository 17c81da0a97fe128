//! Peer connections to the other room occupants.

mod connection;
mod state;
mod table;

pub use connection::{
    PeerConnection, PeerConnectionFactory, PeerNotice, PeerNotification, PeerNotifier,
    RemoteStream,
};
pub use state::{transition, Directive, PeerInput, PeerPhase, Role, Transition};
pub use table::{CandidateAdmission, PeerConnectionTable, PeerEntry};
