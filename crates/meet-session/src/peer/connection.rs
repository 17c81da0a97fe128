//! The peer-connection primitive the session negotiates through.
//!
//! Implementations wrap a real WebRTC stack. They report asynchronous
//! events (gathered ICE candidates, remote tracks) through the
//! [`PeerNotifier`] handed to them at creation, never by calling back into
//! the session directly.

use async_trait::async_trait;
use meet_common::NegotiationError;
use tokio::sync::mpsc;
use tracing::debug;

use crate::media::LocalTrack;
use crate::protocol::{IceCandidate, SessionDescription};

/// Remote media delivered by a peer's `ontrack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerNotice {
    IceCandidate(IceCandidate),
    TrackReceived(RemoteStream),
}

/// A notice tagged with the peer it came from and the session epoch the
/// connection was created in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerNotification {
    pub epoch: u64,
    pub remote_id: String,
    pub notice: PeerNotice,
}

/// Handle a connection uses to post notices into the session inbox.
///
/// Notices travel on their own unbounded channel: callbacks from the WebRTC
/// stack are synchronous and a dropped track or candidate notice is never
/// recovered. Holds only a weak reference, so live connections don't keep a
/// finished session alive.
#[derive(Clone)]
pub struct PeerNotifier {
    epoch: u64,
    remote_id: String,
    inbox: mpsc::WeakUnboundedSender<PeerNotification>,
}

impl PeerNotifier {
    pub fn new(
        epoch: u64,
        remote_id: &str,
        inbox: mpsc::WeakUnboundedSender<PeerNotification>,
    ) -> Self {
        Self {
            epoch,
            remote_id: remote_id.to_string(),
            inbox,
        }
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn ice_candidate(&self, candidate: IceCandidate) -> bool {
        self.post(PeerNotice::IceCandidate(candidate))
    }

    pub fn track_received(&self, stream: RemoteStream) -> bool {
        self.post(PeerNotice::TrackReceived(stream))
    }

    fn post(&self, notice: PeerNotice) -> bool {
        let Some(tx) = self.inbox.upgrade() else {
            debug!(peer = %self.remote_id, "Session gone; dropping peer notice");
            return false;
        };
        let notification = PeerNotification {
            epoch: self.epoch,
            remote_id: self.remote_id.clone(),
            notice,
        };
        match tx.send(notification) {
            Ok(()) => true,
            Err(_) => {
                debug!(peer = %self.remote_id, "Session inbox closed; dropping peer notice");
                false
            }
        }
    }
}

/// One negotiated link to a remote participant.
#[async_trait]
pub trait PeerConnection: Send {
    async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&mut self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    fn add_track(&mut self, track: &LocalTrack) -> Result<(), NegotiationError>;

    /// Tear down the connection. Further calls may fail.
    fn close(&mut self);
}

pub trait PeerConnectionFactory: Send {
    fn create(
        &mut self,
        remote_id: &str,
        ice_servers: &[String],
        notifier: PeerNotifier,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError>;
}
