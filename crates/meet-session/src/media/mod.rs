//! Local capture and the mic/camera flags announced to the room.

mod capture;
mod sync;

pub use capture::{LocalStream, LocalTrack, MediaCapture, TrackKind};
pub use sync::MediaStateSync;
