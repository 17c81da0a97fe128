//! Signaling transport seam.

use meet_common::TransportError;
use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::SignalingCommand;

/// Outbound half of the signaling relay connection.
///
/// Inbound events are fed to the session separately (see
/// [`SessionHandle::deliver`](crate::SessionHandle::deliver)). Sends are
/// fire-and-forget: an `Ok` means queued, not delivered.
pub trait SignalingTransport: Send {
    fn connect(&mut self) -> Result<(), TransportError>;

    fn emit(&mut self, command: SignalingCommand) -> Result<(), TransportError>;

    fn disconnect(&mut self);
}

/// Requests a [`ChannelTransport`] hands to whatever task owns the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRequest {
    Connect,
    Emit(SignalingCommand),
    Disconnect,
}

/// A transport that forwards every request over a channel, for hosts that
/// drive the real socket from their own task.
///
/// The queue is unbounded: one introduction emits an offer per peer inside a
/// single input, and none of them may be dropped. Only a closed receiver
/// fails a send.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<TransportRequest>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, request: TransportRequest) -> Result<(), TransportError> {
        self.tx.send(request).map_err(|_| TransportError::Closed)
    }
}

impl SignalingTransport for ChannelTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.forward(TransportRequest::Connect)
    }

    fn emit(&mut self, command: SignalingCommand) -> Result<(), TransportError> {
        self.forward(TransportRequest::Emit(command))
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.forward(TransportRequest::Disconnect) {
            debug!(error = %e, "Disconnect request dropped");
        }
    }
}
