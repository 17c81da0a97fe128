//! Client-side signaling session: room membership, mesh negotiation, and
//! media announcements.
//!
//! Every input is handled to completion before the next one is looked at;
//! the [`driver`](crate::driver) task guarantees that. Offer/answer steps
//! within one peer are awaited in order, so an answer is only relayed after
//! the local description is committed.
//!
//! Local tracks are attached when a peer entry is created. A capture stream
//! acquired later (say after the camera was denied at join) is not added to
//! connections that already exist.

use meet_common::{new_room_id, MeetError, NegotiationError, ProtocolError, TransportError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::driver::SessionInput;
use crate::media::{MediaCapture, MediaStateSync};
use crate::peer::{
    CandidateAdmission, Directive, PeerConnectionFactory, PeerConnectionTable, PeerEntry,
    PeerInput, PeerNotice, PeerNotification, PeerNotifier, RemoteStream,
};
use crate::protocol::{
    IceCandidate, MediaState, SessionDescription, SignalPayload, SignalingCommand,
    SignalingEvent,
};

use super::transport::SignalingTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    /// Join requested, waiting for the transport to acknowledge.
    Connecting,
    Joined,
}

#[derive(Debug, Clone)]
struct Meeting {
    name: String,
    room_id: String,
}

pub struct SignalingOrchestrator {
    config: SessionConfig,
    transport: Box<dyn SignalingTransport>,
    factory: Box<dyn PeerConnectionFactory>,
    media: MediaStateSync,
    peers: PeerConnectionTable,
    phase: SessionPhase,
    self_id: Option<String>,
    meeting: Option<Meeting>,
    /// Bumped on every join; notices from older connections are stale.
    epoch: u64,
    inbox: mpsc::WeakUnboundedSender<PeerNotification>,
}

impl SignalingOrchestrator {
    pub fn new(
        config: SessionConfig,
        transport: Box<dyn SignalingTransport>,
        factory: Box<dyn PeerConnectionFactory>,
        capture: Box<dyn MediaCapture>,
        inbox: mpsc::WeakUnboundedSender<PeerNotification>,
    ) -> Self {
        let media = MediaStateSync::new(capture, config.initial_media);
        Self {
            config,
            transport,
            factory,
            media,
            peers: PeerConnectionTable::new(),
            phase: SessionPhase::Disconnected,
            self_id: None,
            meeting: None,
            epoch: 0,
            inbox,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    pub fn room_id(&self) -> Option<&str> {
        self.meeting.as_ref().map(|m| m.room_id.as_str())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn peers(&self) -> &PeerConnectionTable {
        &self.peers
    }

    pub fn media(&self) -> &MediaStateSync {
        &self.media
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -- Commands -----------------------------------------------------------

    /// Start a session in `room_id`. Any current session is left first.
    pub async fn join(&mut self, name: &str, room_id: &str) -> Result<(), TransportError> {
        if self.phase != SessionPhase::Disconnected {
            self.leave();
        }

        self.epoch += 1;
        self.meeting = Some(Meeting {
            name: name.to_string(),
            room_id: room_id.to_string(),
        });
        // Capture first so the connections we create can carry our tracks.
        self.media.ensure_stream().await;

        self.phase = SessionPhase::Connecting;
        info!(room = %room_id, epoch = self.epoch, "Joining room");
        if let Err(e) = self.transport.connect() {
            warn!(error = %e, "Signaling connect failed");
            self.phase = SessionPhase::Disconnected;
            self.meeting = None;
            self.media.release();
            return Err(e);
        }
        Ok(())
    }

    /// Join a freshly generated room and return its ID.
    pub async fn create_room(&mut self, name: &str) -> Result<String, TransportError> {
        let room_id = new_room_id();
        self.join(name, &room_id).await?;
        Ok(room_id)
    }

    /// End the session: close every connection, drop the capture stream,
    /// and disconnect. Signals arriving afterwards are no-ops.
    pub fn leave(&mut self) {
        if self.phase == SessionPhase::Disconnected && self.peers.is_empty() {
            return;
        }
        let closed = self.peers.clear();
        self.phase = SessionPhase::Disconnected;
        self.transport.disconnect();
        self.media.release();
        self.self_id = None;
        let room = self.meeting.take().map(|m| m.room_id).unwrap_or_default();
        info!(room = %room, peers = closed, "Left room");
    }

    pub async fn toggle_mic(&mut self) -> MediaState {
        let state = self.media.toggle_mic().await;
        self.announce_media();
        state
    }

    pub async fn toggle_cam(&mut self) -> MediaState {
        let state = self.media.toggle_cam().await;
        self.announce_media();
        state
    }

    // -- Inputs -------------------------------------------------------------

    /// Handle one driver input to completion.
    pub async fn dispatch(&mut self, input: SessionInput) {
        match input {
            SessionInput::Join { name, room_id } => {
                if let Err(e) = self.join(&name, &room_id).await {
                    debug!(room = %room_id, error = %e, "Join command failed");
                }
            }
            SessionInput::Leave => self.leave(),
            SessionInput::ToggleMic => {
                self.toggle_mic().await;
            }
            SessionInput::ToggleCam => {
                self.toggle_cam().await;
            }
            SessionInput::Signaling(event) => self.handle_event(event).await,
            SessionInput::Peer(notification) => self.handle_notification(notification).await,
        }
    }

    pub async fn handle_event(&mut self, event: SignalingEvent) {
        match (self.phase, event) {
            (SessionPhase::Disconnected, event) => {
                debug!(event = event.name(), "Not in a session; ignoring event");
            }
            (_, SignalingEvent::TransportClosed) => {
                warn!("Signaling transport closed; ending session");
                self.leave();
            }
            (SessionPhase::Connecting, SignalingEvent::Connected { id }) => {
                self.on_connected(id);
            }
            (SessionPhase::Connecting, event) => {
                debug!(event = event.name(), "Not joined yet; ignoring event");
            }
            (SessionPhase::Joined, SignalingEvent::Connected { id }) => {
                debug!(id = %id, "Duplicate connect acknowledgment");
            }
            (SessionPhase::Joined, SignalingEvent::Introduction(ids)) => {
                self.on_introduction(ids).await;
            }
            (SessionPhase::Joined, SignalingEvent::NewUserConnected(id)) => {
                self.on_new_participant(&id);
            }
            (SessionPhase::Joined, SignalingEvent::Signal { to, from, payload }) => {
                self.on_signal(&to, &from, payload).await;
            }
            (SessionPhase::Joined, SignalingEvent::MediaUpdate { id, mic, cam }) => {
                self.on_media_update(&id, MediaState { mic, cam });
            }
            (SessionPhase::Joined, SignalingEvent::UserDisconnected(id)) => {
                self.on_participant_disconnected(&id);
            }
        }
    }

    pub async fn handle_notification(&mut self, notification: PeerNotification) {
        if notification.epoch != self.epoch || self.phase != SessionPhase::Joined {
            debug!(
                peer = %notification.remote_id,
                epoch = notification.epoch,
                "Dropping stale peer notice"
            );
            return;
        }
        let PeerNotification {
            remote_id, notice, ..
        } = notification;
        match notice {
            PeerNotice::IceCandidate(candidate) => self.relay_local_candidate(&remote_id, candidate),
            PeerNotice::TrackReceived(stream) => self.on_track(&remote_id, stream),
        }
    }

    // -- Event handlers -----------------------------------------------------

    fn on_connected(&mut self, id: String) {
        let Some(meeting) = self.meeting.clone() else {
            return;
        };
        info!(id = %id, room = %meeting.room_id, "Signaling connected");
        self.self_id = Some(id);
        self.phase = SessionPhase::Joined;
        self.emit(SignalingCommand::Join {
            name: meeting.name,
            room_id: meeting.room_id,
        });
        self.announce_media();
    }

    /// We are the newcomer: offer to every existing occupant.
    async fn on_introduction(&mut self, ids: Vec<String>) {
        debug!(count = ids.len(), "Introduction received");
        for remote_id in ids {
            if self.is_self(&remote_id) {
                continue;
            }
            if let Err(e) = self.offer_to(&remote_id).await {
                warn!(peer = %remote_id, error = %e, "Offer failed");
            }
        }
    }

    /// Someone joined after us. They will offer; we only make room for them.
    fn on_new_participant(&mut self, remote_id: &str) {
        if self.is_self(remote_id) {
            return;
        }
        if let Err(e) = self.ensure_peer(remote_id) {
            warn!(peer = %remote_id, error = %e, "Peer setup failed");
        }
    }

    async fn on_signal(&mut self, to: &str, from: &str, payload: SignalPayload) {
        if !self.is_self(to) {
            let e = ProtocolError::Misaddressed { to: to.to_string() };
            debug!(from = %from, error = %e, "Ignoring signal");
            return;
        }
        if self.is_self(from) {
            debug!("Ignoring signal from ourselves");
            return;
        }

        let kind = payload.kind();
        let result = match payload {
            SignalPayload::Offer { sdp } => self.on_offer(from, sdp).await,
            SignalPayload::Answer { sdp } => self.on_answer(from, sdp).await,
            SignalPayload::Candidate { candidate } => {
                self.on_remote_candidate(from, candidate).await;
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(peer = %from, kind, error = %e, "Signal handling failed");
        }
    }

    async fn on_offer(&mut self, from: &str, offer: SessionDescription) -> Result<(), MeetError> {
        let self_id = self.local_id()?;
        let entry = self.ensure_peer(from)?;
        if entry.advance(PeerInput::RemoteOffer)? != Directive::SendAnswer {
            return Ok(());
        }

        let connection = entry.connection_mut();
        connection.set_remote_description(offer).await?;
        let answer = connection.create_answer().await?;
        connection.set_local_description(answer.clone()).await?;
        entry.flush_candidates().await;

        self.emit(SignalingCommand::Signal {
            to: from.to_string(),
            from: self_id,
            payload: SignalPayload::Answer { sdp: answer },
        });
        Ok(())
    }

    async fn on_answer(&mut self, from: &str, answer: SessionDescription) -> Result<(), MeetError> {
        let Some(entry) = self.peers.get_mut(from) else {
            return Err(ProtocolError::UnknownPeer(from.to_string()).into());
        };
        if entry.advance(PeerInput::RemoteAnswer)? != Directive::ApplyAnswer {
            return Ok(());
        }
        entry
            .connection_mut()
            .set_remote_description(answer)
            .await?;
        entry.flush_candidates().await;
        Ok(())
    }

    /// Candidate problems never escalate past a log line.
    async fn on_remote_candidate(&mut self, from: &str, candidate: IceCandidate) {
        let Some(entry) = self.peers.get_mut(from) else {
            debug!(peer = %from, "Candidate for unknown peer discarded");
            return;
        };
        match entry.admit_candidate(&candidate) {
            CandidateAdmission::Duplicate => {
                debug!(peer = %from, "Duplicate candidate skipped");
            }
            CandidateAdmission::Buffered => {
                debug!(peer = %from, pending = entry.pending_candidates(), "Candidate buffered");
            }
            CandidateAdmission::Apply => {
                if let Err(e) = entry.apply_candidate(candidate).await {
                    debug!(peer = %from, error = %e, "Candidate rejected");
                }
            }
        }
    }

    /// Announcements can precede discovery, so an unknown sender gets an entry.
    fn on_media_update(&mut self, remote_id: &str, state: MediaState) {
        if self.is_self(remote_id) {
            return;
        }
        match self.ensure_peer(remote_id) {
            Ok(entry) => {
                entry.set_remote_media(state);
                debug!(peer = %remote_id, mic = state.mic, cam = state.cam, "Remote media updated");
            }
            Err(e) => warn!(peer = %remote_id, error = %e, "Peer setup failed"),
        }
    }

    fn on_participant_disconnected(&mut self, remote_id: &str) {
        if self.peers.remove(remote_id) {
            info!(peer = %remote_id, remaining = self.peers.len(), "Peer left");
        } else {
            debug!(peer = %remote_id, "Disconnect for unknown peer");
        }
    }

    fn relay_local_candidate(&mut self, remote_id: &str, candidate: IceCandidate) {
        if !self.peers.contains(remote_id) {
            return;
        }
        let Some(self_id) = self.self_id.clone() else {
            return;
        };
        self.emit(SignalingCommand::Signal {
            to: remote_id.to_string(),
            from: self_id,
            payload: SignalPayload::Candidate { candidate },
        });
    }

    fn on_track(&mut self, remote_id: &str, stream: RemoteStream) {
        let Some(entry) = self.peers.get_mut(remote_id) else {
            debug!(peer = %remote_id, "Track for unknown peer ignored");
            return;
        };
        match entry.advance(PeerInput::TrackReceived) {
            Ok(_) => {
                info!(peer = %remote_id, stream = %stream.id, "Remote media connected");
                entry.attach_stream(stream);
            }
            Err(e) => debug!(peer = %remote_id, error = %e, "Track ignored"),
        }
    }

    // -- Helpers ------------------------------------------------------------

    async fn offer_to(&mut self, remote_id: &str) -> Result<(), MeetError> {
        let self_id = self.local_id()?;
        let entry = self.ensure_peer(remote_id)?;
        match entry.advance(PeerInput::Initiate) {
            Ok(Directive::SendOffer) => {}
            Ok(_) => return Ok(()),
            Err(e) => {
                debug!(peer = %remote_id, error = %e, "Not offering");
                return Ok(());
            }
        }

        let connection = entry.connection_mut();
        let offer = connection.create_offer().await?;
        connection.set_local_description(offer.clone()).await?;

        self.emit(SignalingCommand::Signal {
            to: remote_id.to_string(),
            from: self_id,
            payload: SignalPayload::Offer { sdp: offer },
        });
        Ok(())
    }

    /// Reuse the entry for `remote_id` or create one, attaching local tracks.
    fn ensure_peer(&mut self, remote_id: &str) -> Result<&mut PeerEntry, NegotiationError> {
        let Self {
            config,
            factory,
            media,
            peers,
            epoch,
            inbox,
            ..
        } = self;

        let (entry, created) = peers.ensure(remote_id, || {
            let notifier = PeerNotifier::new(*epoch, remote_id, inbox.clone());
            let mut connection = factory.create(remote_id, &config.ice_servers, notifier)?;
            if let Some(stream) = media.stream() {
                for track in stream.tracks() {
                    if let Err(e) = connection.add_track(&track) {
                        warn!(peer = %remote_id, track = %track.id, error = %e, "Track not attached");
                    }
                }
            }
            Ok(connection)
        })?;
        if created {
            debug!(peer = %remote_id, "Peer entry created");
        }
        Ok(entry)
    }

    fn announce_media(&mut self) {
        if self.phase != SessionPhase::Joined {
            return;
        }
        let state = self.media.state();
        self.emit(SignalingCommand::MediaUpdate {
            mic: state.mic,
            cam: state.cam,
        });
    }

    /// Fire-and-forget send. Transport failures are logged and dropped.
    fn emit(&mut self, command: SignalingCommand) {
        if let Err(e) = self.transport.emit(command) {
            warn!(error = %e, "Signaling send failed");
        }
    }

    fn is_self(&self, id: &str) -> bool {
        self.self_id.as_deref() == Some(id)
    }

    fn local_id(&self) -> Result<String, ProtocolError> {
        self.self_id.clone().ok_or(ProtocolError::NotJoined)
    }
}
