//! Live peer connections, keyed by remote participant ID.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use meet_common::NegotiationError;
use tracing::debug;

use crate::protocol::{IceCandidate, MediaState};

use super::connection::{PeerConnection, RemoteStream};
use super::state::{transition, Directive, PeerInput, PeerPhase, Transition};

/// What happened to an incoming remote candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAdmission {
    /// Remote description is in place; apply it now.
    Apply,
    /// Held until the remote description is applied.
    Buffered,
    /// Already seen for this peer.
    Duplicate,
}

pub struct PeerEntry {
    remote_id: String,
    connection: Box<dyn PeerConnection>,
    phase: PeerPhase,
    remote_media: MediaState,
    remote_stream: Option<RemoteStream>,
    pending_candidates: Vec<IceCandidate>,
    seen_candidates: HashSet<IceCandidate>,
}

impl PeerEntry {
    fn new(remote_id: &str, connection: Box<dyn PeerConnection>) -> Self {
        Self {
            remote_id: remote_id.to_string(),
            connection,
            phase: PeerPhase::Pending,
            remote_media: MediaState::default(),
            remote_stream: None,
            pending_candidates: Vec::new(),
            seen_candidates: HashSet::new(),
        }
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn phase(&self) -> PeerPhase {
        self.phase
    }

    pub fn remote_media(&self) -> MediaState {
        self.remote_media
    }

    pub fn set_remote_media(&mut self, state: MediaState) {
        self.remote_media = state;
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Run the state machine. On success the phase has moved and the caller
    /// must carry out the returned directive.
    pub fn advance(&mut self, input: PeerInput) -> Result<Directive, NegotiationError> {
        match transition(self.phase, input) {
            Transition::Advance { next, directive } => {
                if next != self.phase {
                    debug!(
                        peer = %self.remote_id,
                        from = self.phase.name(),
                        to = next.name(),
                        "Peer phase changed"
                    );
                }
                self.phase = next;
                Ok(directive)
            }
            Transition::Reject(reason) => Err(NegotiationError::InvalidTransition(reason)),
        }
    }

    pub(crate) fn connection_mut(&mut self) -> &mut dyn PeerConnection {
        self.connection.as_mut()
    }

    pub(crate) fn attach_stream(&mut self, stream: RemoteStream) {
        self.remote_stream = Some(stream);
    }

    pub(crate) fn admit_candidate(&mut self, candidate: &IceCandidate) -> CandidateAdmission {
        if !self.seen_candidates.insert(candidate.clone()) {
            return CandidateAdmission::Duplicate;
        }
        if self.phase.accepts_candidates() {
            CandidateAdmission::Apply
        } else {
            self.pending_candidates.push(candidate.clone());
            CandidateAdmission::Buffered
        }
    }

    /// Apply one remote candidate. Failures are reported to the caller, who
    /// treats them as non-fatal.
    pub(crate) async fn apply_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        self.connection.add_ice_candidate(candidate).await
    }

    /// Apply every buffered candidate, in arrival order. Returns how many
    /// were accepted.
    pub(crate) async fn flush_candidates(&mut self) -> usize {
        if !self.phase.accepts_candidates() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending_candidates);
        let mut applied = 0;
        for candidate in pending {
            match self.connection.add_ice_candidate(candidate).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    debug!(peer = %self.remote_id, error = %e, "Buffered candidate rejected");
                }
            }
        }
        applied
    }

    fn close(&mut self) {
        if let Ok(Directive::Release) = self.advance(PeerInput::Close) {
            self.connection.close();
        }
    }
}

/// At most one entry per remote participant.
#[derive(Default)]
pub struct PeerConnectionTable {
    entries: HashMap<String, PeerEntry>,
}

impl PeerConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `remote_id`, creating it with `create` if absent.
    /// The flag reports whether a new entry was made.
    pub fn ensure<F>(
        &mut self,
        remote_id: &str,
        create: F,
    ) -> Result<(&mut PeerEntry, bool), NegotiationError>
    where
        F: FnOnce() -> Result<Box<dyn PeerConnection>, NegotiationError>,
    {
        match self.entries.entry(remote_id.to_string()) {
            Entry::Occupied(e) => Ok((e.into_mut(), false)),
            Entry::Vacant(v) => {
                let connection = create()?;
                Ok((v.insert(PeerEntry::new(remote_id, connection)), true))
            }
        }
    }

    pub fn get(&self, remote_id: &str) -> Option<&PeerEntry> {
        self.entries.get(remote_id)
    }

    pub fn get_mut(&mut self, remote_id: &str) -> Option<&mut PeerEntry> {
        self.entries.get_mut(remote_id)
    }

    pub fn contains(&self, remote_id: &str) -> bool {
        self.entries.contains_key(remote_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remote IDs, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.entries.values()
    }

    /// Close the connection, then drop the entry.
    pub fn remove(&mut self, remote_id: &str) -> bool {
        let Some(entry) = self.entries.get_mut(remote_id) else {
            return false;
        };
        entry.close();
        self.entries.remove(remote_id);
        true
    }

    /// Close and drop everything. Returns how many entries were closed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        for entry in self.entries.values_mut() {
            entry.close();
        }
        self.entries.clear();
        count
    }
}
