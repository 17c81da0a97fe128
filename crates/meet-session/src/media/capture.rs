//! Capture device abstraction.

use async_trait::async_trait;
use meet_common::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One captured track, as attached to a peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// A live capture stream. Disabling a track keeps it attached but silent/black.
pub trait LocalStream: Send {
    fn tracks(&self) -> Vec<LocalTrack>;

    fn set_enabled(&mut self, kind: TrackKind, enabled: bool);

    /// Release the devices. The stream is unusable afterwards.
    fn stop(&mut self);
}

/// Source of local media. Acquisition may prompt for permission.
#[async_trait]
pub trait MediaCapture: Send {
    async fn acquire(&mut self) -> Result<Box<dyn LocalStream>, CaptureError>;
}
