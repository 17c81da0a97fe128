pub mod chat;
pub mod errors;
pub mod id;

pub use chat::{ChatMessage, ClientFrame, FrameUser, RelayFrame};
pub use errors::{
    CaptureError, ConfigError, MeetError, NegotiationError, ProtocolError, TransportError,
};
pub use id::{new_id, new_member_id, new_message_id, new_room_id, now_millis};

pub type Result<T> = std::result::Result<T, MeetError>;
