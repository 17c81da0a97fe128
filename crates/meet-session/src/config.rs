//! Session settings, derived from the `[client]` and `[media]` sections.

use meet_config::MeetConfig;

use crate::protocol::MediaState;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chat_url: String,
    pub signaling_url: String,
    pub ice_servers: Vec<String>,
    pub chat_history_limit: usize,
    /// Mic/camera flags a fresh session starts with.
    pub initial_media: MediaState,
}

impl SessionConfig {
    pub fn from_config(config: &MeetConfig) -> Self {
        Self {
            chat_url: config.client.chat_url.clone(),
            signaling_url: config.client.signaling_url.clone(),
            ice_servers: config.client.ice_servers.clone(),
            chat_history_limit: config.client.chat_history_limit,
            initial_media: MediaState {
                mic: config.media.mic_on_start,
                cam: config.media.cam_on_start,
            },
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&MeetConfig::default())
    }
}
