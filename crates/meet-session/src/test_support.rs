//! In-memory fakes for the transport, capture, and peer-connection seams.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use meet_common::{CaptureError, NegotiationError, TransportError};

use crate::media::{LocalStream, LocalTrack, MediaCapture, TrackKind};
use crate::peer::{PeerConnection, PeerConnectionFactory, PeerNotifier};
use crate::protocol::{IceCandidate, SdpType, SessionDescription, SignalingCommand};
use crate::signaling::SignalingTransport;

// ---------------------------------------------------------------------------
// Peer connections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnCall {
    AddTrack(TrackKind),
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddCandidate(String),
    Close,
}

struct ConnRecord {
    remote_id: String,
    calls: Vec<ConnCall>,
    notifier: Option<PeerNotifier>,
    closed: bool,
}

#[derive(Default)]
struct NetworkState {
    records: Vec<ConnRecord>,
    reject_candidates: bool,
    fail_create: bool,
}

/// Records every connection created and every call made on it.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl FakeNetwork {
    pub fn factory(&self) -> Box<dyn PeerConnectionFactory> {
        Box::new(FakeFactory { net: self.clone() })
    }

    /// A standalone connection with no notifier.
    pub fn connection(&self, remote_id: &str) -> Box<dyn PeerConnection> {
        self.register(remote_id, None)
    }

    fn register(&self, remote_id: &str, notifier: Option<PeerNotifier>) -> Box<dyn PeerConnection> {
        let mut state = self.state.lock().unwrap();
        state.records.push(ConnRecord {
            remote_id: remote_id.to_string(),
            calls: Vec::new(),
            notifier,
            closed: false,
        });
        Box::new(FakeConnection {
            net: self.clone(),
            index: state.records.len() - 1,
            remote_id: remote_id.to_string(),
        })
    }

    pub fn connections_for(&self, remote_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|r| r.remote_id == remote_id)
            .count()
    }

    pub fn total_connections(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    /// Calls on the most recent connection to `remote_id`.
    pub fn calls(&self, remote_id: &str) -> Vec<ConnCall> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .rev()
            .find(|r| r.remote_id == remote_id)
            .map(|r| r.calls.clone())
            .unwrap_or_default()
    }

    pub fn count_calls(&self, remote_id: &str, call: &ConnCall) -> usize {
        self.calls(remote_id).iter().filter(|c| *c == call).count()
    }

    pub fn is_closed(&self, remote_id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .rev()
            .find(|r| r.remote_id == remote_id)
            .is_some_and(|r| r.closed)
    }

    /// Notifier of the most recent connection to `remote_id`.
    pub fn notifier(&self, remote_id: &str) -> PeerNotifier {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .rev()
            .find(|r| r.remote_id == remote_id)
            .and_then(|r| r.notifier.clone())
            .expect("no factory-made connection for peer")
    }

    pub fn reject_candidates(&self) {
        self.state.lock().unwrap().reject_candidates = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }
}

struct FakeFactory {
    net: FakeNetwork,
}

impl PeerConnectionFactory for FakeFactory {
    fn create(
        &mut self,
        remote_id: &str,
        _ice_servers: &[String],
        notifier: PeerNotifier,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError> {
        if self.net.state.lock().unwrap().fail_create {
            return Err(NegotiationError::Setup("factory failure".into()));
        }
        Ok(self.net.register(remote_id, Some(notifier)))
    }
}

struct FakeConnection {
    net: FakeNetwork,
    index: usize,
    remote_id: String,
}

impl FakeConnection {
    fn record(&self, call: ConnCall) {
        let mut state = self.net.state.lock().unwrap();
        state.records[self.index].calls.push(call);
    }

    fn closed(&self) -> bool {
        self.net.state.lock().unwrap().records[self.index].closed
    }
}

#[async_trait]
impl PeerConnection for FakeConnection {
    async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        self.record(ConnCall::CreateOffer);
        Ok(SessionDescription::offer(format!("offer-to-{}", self.remote_id)))
    }

    async fn create_answer(&mut self) -> Result<SessionDescription, NegotiationError> {
        self.record(ConnCall::CreateAnswer);
        Ok(SessionDescription::answer(format!("answer-to-{}", self.remote_id)))
    }

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(ConnCall::SetLocal(description.kind));
        Ok(())
    }

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(ConnCall::SetRemote(description.kind));
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.record(ConnCall::AddCandidate(candidate.candidate));
        if self.closed() {
            return Err(NegotiationError::Candidate("connection closed".into()));
        }
        if self.net.state.lock().unwrap().reject_candidates {
            return Err(NegotiationError::Candidate("malformed candidate".into()));
        }
        Ok(())
    }

    fn add_track(&mut self, track: &LocalTrack) -> Result<(), NegotiationError> {
        self.record(ConnCall::AddTrack(track.kind));
        Ok(())
    }

    fn close(&mut self) {
        self.record(ConnCall::Close);
        self.net.state.lock().unwrap().records[self.index].closed = true;
    }
}

// ---------------------------------------------------------------------------
// Signaling transport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TransportState {
    connects: usize,
    disconnects: usize,
    emitted: Vec<SignalingCommand>,
    fail_connect: bool,
    fail_emit: bool,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn emitted(&self) -> Vec<SignalingCommand> {
        self.state.lock().unwrap().emitted.clone()
    }

    pub fn take_emitted(&self) -> Vec<SignalingCommand> {
        std::mem::take(&mut self.state.lock().unwrap().emitted)
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn fail_connect(&self) {
        self.state.lock().unwrap().fail_connect = true;
    }

    pub fn fail_emit(&self, fail: bool) {
        self.state.lock().unwrap().fail_emit = fail;
    }
}

impl SignalingTransport for FakeTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(TransportError::Connect("relay unreachable".into()));
        }
        state.connects += 1;
        Ok(())
    }

    fn emit(&mut self, command: SignalingCommand) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_emit {
            return Err(TransportError::Closed);
        }
        state.emitted.push(command);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state.lock().unwrap().disconnects += 1;
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CaptureState {
    deny: bool,
    acquired: usize,
    stopped: usize,
    audio: Option<bool>,
    video: Option<bool>,
}

/// Capture device whose track flags can be inspected.
#[derive(Clone, Default)]
pub struct FakeCapture {
    state: Arc<Mutex<CaptureState>>,
}

impl FakeCapture {
    pub fn denying() -> Self {
        let capture = Self::default();
        capture.state.lock().unwrap().deny = true;
        capture
    }

    pub fn grant(&self) {
        self.state.lock().unwrap().deny = false;
    }

    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }

    pub fn stopped(&self) -> usize {
        self.state.lock().unwrap().stopped
    }

    pub fn audio_enabled(&self) -> Option<bool> {
        self.state.lock().unwrap().audio
    }

    pub fn video_enabled(&self) -> Option<bool> {
        self.state.lock().unwrap().video
    }
}

#[async_trait]
impl MediaCapture for FakeCapture {
    async fn acquire(&mut self) -> Result<Box<dyn LocalStream>, CaptureError> {
        let mut state = self.state.lock().unwrap();
        if state.deny {
            return Err(CaptureError::PermissionDenied);
        }
        state.acquired += 1;
        state.audio = Some(true);
        state.video = Some(true);
        Ok(Box::new(FakeStream {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeStream {
    state: Arc<Mutex<CaptureState>>,
}

impl LocalStream for FakeStream {
    fn tracks(&self) -> Vec<LocalTrack> {
        vec![
            LocalTrack {
                id: "mic-0".into(),
                kind: TrackKind::Audio,
            },
            LocalTrack {
                id: "cam-0".into(),
                kind: TrackKind::Video,
            },
        ]
    }

    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        match kind {
            TrackKind::Audio => state.audio = Some(enabled),
            TrackKind::Video => state.video = Some(enabled),
        }
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().stopped += 1;
    }
}
