//! Signaling relay client: the session state machine and its transport.

mod orchestrator;
mod transport;


pub use orchestrator::{SessionPhase, SignalingOrchestrator};
pub use transport::{ChannelTransport, SignalingTransport, TransportRequest};
