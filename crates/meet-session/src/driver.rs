//! Session task and the handle used to feed it.
//!
//! User commands and signaling events share a bounded channel; peer notices
//! have an unbounded one of their own. A single task drains both and
//! processes one input at a time.

use meet_common::new_room_id;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::peer::PeerNotification;
use crate::protocol::SignalingEvent;
use crate::signaling::SignalingOrchestrator;

#[derive(Debug, Clone)]
pub enum SessionInput {
    Join { name: String, room_id: String },
    Leave,
    ToggleMic,
    ToggleCam,
    Signaling(SignalingEvent),
    Peer(PeerNotification),
}

/// Cloneable sender for a running session. The session task ends once
/// every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionInput>,
    notice_tx: mpsc::UnboundedSender<PeerNotification>,
}

/// Receiving side of a session's inputs.
pub struct SessionInbox {
    commands: mpsc::Receiver<SessionInput>,
    notices: mpsc::UnboundedReceiver<PeerNotification>,
}

impl SessionInbox {
    /// Next input. Pending peer notices go first. `None` once every handle
    /// is gone and both queues are drained.
    pub async fn recv(&mut self) -> Option<SessionInput> {
        tokio::select! {
            biased;
            Some(notice) = self.notices.recv() => Some(SessionInput::Peer(notice)),
            input = self.commands.recv() => input,
        }
    }

    pub fn try_recv(&mut self) -> Option<SessionInput> {
        if let Ok(notice) = self.notices.try_recv() {
            return Some(SessionInput::Peer(notice));
        }
        self.commands.try_recv().ok()
    }
}

impl SessionHandle {
    /// `capacity` bounds the command queue only.
    pub fn channel(capacity: usize) -> (Self, SessionInbox) {
        let (tx, commands) = mpsc::channel(capacity);
        let (notice_tx, notices) = mpsc::unbounded_channel();
        (Self { tx, notice_tx }, SessionInbox { commands, notices })
    }

    /// Weak notice-queue reference for the orchestrator's peer notifiers.
    pub fn downgrade(&self) -> mpsc::WeakUnboundedSender<PeerNotification> {
        self.notice_tx.downgrade()
    }

    pub async fn join(&self, name: &str, room_id: &str) -> bool {
        self.send(SessionInput::Join {
            name: name.to_string(),
            room_id: room_id.to_string(),
        })
        .await
    }

    /// Join a freshly generated room. Returns its ID.
    pub async fn create_room(&self, name: &str) -> Option<String> {
        let room_id = new_room_id();
        self.join(name, &room_id).await.then_some(room_id)
    }

    pub async fn leave(&self) -> bool {
        self.send(SessionInput::Leave).await
    }

    pub async fn toggle_mic(&self) -> bool {
        self.send(SessionInput::ToggleMic).await
    }

    pub async fn toggle_cam(&self) -> bool {
        self.send(SessionInput::ToggleCam).await
    }

    /// Hand an event received from the signaling relay to the session.
    pub async fn deliver(&self, event: SignalingEvent) -> bool {
        self.send(SessionInput::Signaling(event)).await
    }

    async fn send(&self, input: SessionInput) -> bool {
        match self.tx.send(input).await {
            Ok(()) => true,
            Err(_) => {
                debug!("Session task gone");
                false
            }
        }
    }
}

/// Process inputs until every handle is dropped, then leave.
pub async fn run_session(mut orchestrator: SignalingOrchestrator, mut inbox: SessionInbox) {
    while let Some(input) = inbox.recv().await {
        orchestrator.dispatch(input).await;
    }
    orchestrator.leave();
    info!("Session task finished");
}

pub fn spawn_session(orchestrator: SignalingOrchestrator, inbox: SessionInbox) -> JoinHandle<()> {
    tokio::spawn(run_session(orchestrator, inbox))
}
