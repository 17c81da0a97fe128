//! Chat relay wire protocol and the chat message data model.
//!
//! Frames are JSON text messages tagged by `type`. Field names use the
//! camelCase spelling the browser client sends (`userId`, `roomId`).

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;
use crate::id::{new_id, new_message_id, now_millis};

/// Sender name shown when a frame omits it.
pub const UNKNOWN_SENDER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Join {
        #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        name: String,
        #[serde(rename = "roomId")]
        room_id: String,
    },
    Message {
        text: String,
    },
    Typing,
}

const CLIENT_FRAME_TYPES: &[&str] = &["join", "message", "typing"];

impl ClientFrame {
    /// Parse a text frame, telling unknown `type`s apart from malformed bodies.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ProtocolError::Malformed("missing \"type\"".into()))?;
        if !CLIENT_FRAME_TYPES.contains(&kind) {
            return Err(ProtocolError::UnknownType(kind.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameUser {
    #[serde(default)]
    pub name: String,
}

/// Frames the relay sends. Fields default when absent so clients can read
/// frames from older or foreign relays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayFrame {
    System {
        #[serde(default)]
        text: String,
        #[serde(default)]
        at: i64,
    },
    Message {
        #[serde(default)]
        id: String,
        #[serde(default)]
        user: FrameUser,
        #[serde(default)]
        text: String,
        #[serde(default)]
        at: i64,
    },
    Typing {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName", default)]
        user_name: String,
    },
}

impl RelayFrame {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            text: text.into(),
            at: now_millis(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Convert a received frame into a chat log entry. Typing indicators
    /// are not chat messages and yield `None`.
    pub fn into_chat_message(self) -> Option<ChatMessage> {
        match self {
            Self::System { text, at } => Some(ChatMessage::System {
                id: new_id(),
                text,
                at: or_now(at),
            }),
            Self::Message { id, user, text, at } => Some(ChatMessage::User {
                id: if id.is_empty() { new_id() } else { id },
                sender: if user.name.is_empty() {
                    UNKNOWN_SENDER.to_string()
                } else {
                    user.name
                },
                text,
                at: or_now(at),
            }),
            Self::Typing { .. } => None,
        }
    }
}

fn or_now(at: i64) -> i64 {
    if at > 0 {
        at
    } else {
        now_millis()
    }
}

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// A chat message. Immutable once broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        id: String,
        text: String,
        at: i64,
    },
    User {
        id: String,
        sender: String,
        text: String,
        at: i64,
    },
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            id: new_message_id(),
            text: text.into(),
            at: now_millis(),
        }
    }

    pub fn user(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::User {
            id: new_message_id(),
            sender: sender.into(),
            text: text.into(),
            at: now_millis(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::System { id, .. } | Self::User { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::System { text, .. } | Self::User { text, .. } => text,
        }
    }

    pub fn at(&self) -> i64 {
        match self {
            Self::System { at, .. } | Self::User { at, .. } => *at,
        }
    }
}

impl From<&ChatMessage> for RelayFrame {
    fn from(msg: &ChatMessage) -> Self {
        match msg {
            ChatMessage::System { text, at, .. } => RelayFrame::System {
                text: text.clone(),
                at: *at,
            },
            ChatMessage::User {
                id,
                sender,
                text,
                at,
            } => RelayFrame::Message {
                id: id.clone(),
                user: FrameUser {
                    name: sender.clone(),
                },
                text: text.clone(),
                at: *at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_join_frame() {
        let frame =
            ClientFrame::parse(r#"{"type":"join","userId":"a1","name":"Ana","roomId":"r1"}"#)
                .unwrap();
        assert_eq!(
            frame,
            ClientFrame::Join {
                user_id: Some("a1".into()),
                name: "Ana".into(),
                room_id: "r1".into(),
            }
        );
    }

    #[test]
    fn parse_join_without_user_id() {
        let frame = ClientFrame::parse(r#"{"type":"join","name":"Ana","roomId":"r1"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Join { user_id: None, .. }));
    }

    #[test]
    fn parse_typing_unit_frame() {
        assert_eq!(
            ClientFrame::parse(r#"{"type":"typing"}"#).unwrap(),
            ClientFrame::Typing
        );
    }

    #[test]
    fn parse_unknown_type() {
        let err = ClientFrame::parse(r#"{"type":"wave"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref t) if t == "wave"));
    }

    #[test]
    fn parse_malformed_payloads() {
        assert!(matches!(
            ClientFrame::parse("not json").unwrap_err(),
            ProtocolError::Malformed(_)
        ));
        assert!(matches!(
            ClientFrame::parse(r#"{"text":"hi"}"#).unwrap_err(),
            ProtocolError::Malformed(_)
        ));
        // Known type, missing required field.
        assert!(matches!(
            ClientFrame::parse(r#"{"type":"message"}"#).unwrap_err(),
            ProtocolError::Malformed(_)
        ));
    }

    #[test]
    fn relay_message_wire_shape() {
        let msg = ChatMessage::User {
            id: "msg-1".into(),
            sender: "Ana".into(),
            text: "hola".into(),
            at: 42,
        };
        let json: serde_json::Value =
            serde_json::from_str(&RelayFrame::from(&msg).to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "message",
                "id": "msg-1",
                "user": { "name": "Ana" },
                "text": "hola",
                "at": 42
            })
        );
    }

    #[test]
    fn relay_typing_wire_shape() {
        let frame = RelayFrame::Typing {
            user_id: "a1".into(),
            user_name: "Ana".into(),
        };
        let json: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "typing", "userId": "a1", "userName": "Ana" })
        );
    }

    #[test]
    fn sparse_message_frame_gets_defaults() {
        let frame: RelayFrame = serde_json::from_str(r#"{"type":"message","text":"hi"}"#).unwrap();
        let msg = frame.into_chat_message().unwrap();
        match msg {
            ChatMessage::User {
                id, sender, at, ..
            } => {
                assert!(!id.is_empty());
                assert_eq!(sender, UNKNOWN_SENDER);
                assert!(at > 0);
            }
            other => panic!("expected user message, got {other:?}"),
        }
    }

    #[test]
    fn typing_frame_is_not_a_chat_message() {
        let frame = RelayFrame::Typing {
            user_id: "a1".into(),
            user_name: "Ana".into(),
        };
        assert!(frame.into_chat_message().is_none());
    }

    #[test]
    fn chat_message_accessors() {
        let msg = ChatMessage::system("welcome");
        assert!(msg.id().starts_with("msg-"));
        assert_eq!(msg.text(), "welcome");
        assert!(msg.at() > 0);
    }
}
