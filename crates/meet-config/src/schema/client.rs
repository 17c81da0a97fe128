//! Client-side endpoint and media settings.

use serde::{Deserialize, Serialize};

/// Endpoints the meeting client talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the chat relay.
    pub chat_url: String,
    /// URL of the signaling relay.
    pub signaling_url: String,
    /// STUN/TURN servers handed to the peer-connection primitive.
    pub ice_servers: Vec<String>,
    /// Messages kept in the session-local chat log.
    pub chat_history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chat_url: "ws://localhost:3000".into(),
            signaling_url: "http://localhost:9000".into(),
            ice_servers: vec!["stun:stun.l.google.com:19302".into()],
            chat_history_limit: 500,
        }
    }
}

/// Initial local media flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub mic_on_start: bool,
    pub cam_on_start: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            mic_on_start: true,
            cam_on_start: true,
        }
    }
}
