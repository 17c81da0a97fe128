//! Local mic/camera state and the capture stream it controls.

use tracing::{debug, info, warn};

use crate::protocol::MediaState;

use super::capture::{LocalStream, MediaCapture, TrackKind};

/// Owns the capture stream and the flags we announce to the room.
///
/// The flags are authoritative: a toggle always flips them, even while no
/// stream exists (permission not yet granted). Whenever a stream is
/// acquired later, the current flags are applied to its tracks.
pub struct MediaStateSync {
    capture: Box<dyn MediaCapture>,
    stream: Option<Box<dyn LocalStream>>,
    local: MediaState,
}

impl MediaStateSync {
    pub fn new(capture: Box<dyn MediaCapture>, initial: MediaState) -> Self {
        Self {
            capture,
            stream: None,
            local: initial,
        }
    }

    pub fn state(&self) -> MediaState {
        self.local
    }

    pub fn stream(&self) -> Option<&dyn LocalStream> {
        self.stream.as_deref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Acquire the capture stream if we don't hold one. Returns whether a
    /// stream is available afterwards; a denied capture leaves the session
    /// in receive-only mode.
    pub async fn ensure_stream(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }
        match self.capture.acquire().await {
            Ok(stream) => {
                info!(tracks = stream.tracks().len(), "Local media acquired");
                self.stream = Some(stream);
                self.apply_flags();
                true
            }
            Err(e) => {
                warn!(error = %e, "Local media unavailable; continuing without it");
                false
            }
        }
    }

    pub async fn toggle_mic(&mut self) -> MediaState {
        self.local.mic = !self.local.mic;
        debug!(mic = self.local.mic, "Mic toggled");
        self.ensure_stream().await;
        self.apply_flags();
        self.local
    }

    pub async fn toggle_cam(&mut self) -> MediaState {
        self.local.cam = !self.local.cam;
        debug!(cam = self.local.cam, "Camera toggled");
        self.ensure_stream().await;
        self.apply_flags();
        self.local
    }

    /// Stop and drop the capture stream. Flags are kept for the next join.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Local media released");
        }
    }

    fn apply_flags(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.set_enabled(TrackKind::Audio, self.local.mic);
            stream.set_enabled(TrackKind::Video, self.local.cam);
        }
    }
}
