//! Environment variable overrides.

use tracing::{debug, warn};

use crate::schema::MeetConfig;

pub const PORT_VAR: &str = "PORT";
pub const CHAT_URL_VAR: &str = "MEET_CHAT_WS_URL";
pub const SIGNALING_URL_VAR: &str = "MEET_SIGNALING_URL";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut MeetConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup. Unparsable values are ignored.
pub fn apply_overrides_from<F>(config: &mut MeetConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(PORT_VAR) {
        match raw.trim().parse::<u16>() {
            Ok(port) => {
                debug!(port, "relay port overridden from environment");
                config.relay.port = port;
            }
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {PORT_VAR}"),
        }
    }
    if let Some(url) = lookup(CHAT_URL_VAR) {
        config.client.chat_url = url;
    }
    if let Some(url) = lookup(SIGNALING_URL_VAR) {
        config.client.signaling_url = url;
    }
}
