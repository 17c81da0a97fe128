//! Config validation.

use meet_common::ConfigError;

use crate::schema::MeetConfig;

/// Validate a config, returning the first violation found.
pub fn validate(config: &MeetConfig) -> Result<(), ConfigError> {
    if config.relay.port == 0 {
        return Err(invalid("relay.port must be non-zero"));
    }
    if config.relay.channel_capacity == 0 {
        return Err(invalid("relay.channel_capacity must be non-zero"));
    }
    if config.relay.bind_address.trim().is_empty() {
        return Err(invalid("relay.bind_address must not be empty"));
    }
    if !has_scheme(&config.client.chat_url, &["ws://", "wss://"]) {
        return Err(invalid(format!(
            "client.chat_url must be a ws:// or wss:// URL, got {:?}",
            config.client.chat_url
        )));
    }
    if !has_scheme(
        &config.client.signaling_url,
        &["http://", "https://", "ws://", "wss://"],
    ) {
        return Err(invalid(format!(
            "client.signaling_url must be an http(s):// or ws(s):// URL, got {:?}",
            config.client.signaling_url
        )));
    }
    for server in &config.client.ice_servers {
        if !has_scheme(server, &["stun:", "turn:", "turns:"]) {
            return Err(invalid(format!(
                "client.ice_servers entry {server:?} must start with stun:, turn: or turns:"
            )));
        }
    }
    if config.client.chat_history_limit == 0 {
        return Err(invalid("client.chat_history_limit must be non-zero"));
    }
    Ok(())
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|s| url.starts_with(s) && url.len() > s.len())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&MeetConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_rejected() {
        let mut config = MeetConfig::default();
        config.relay.port = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("relay.port"));
    }

    #[test]
    fn chat_url_needs_ws_scheme() {
        let mut config = MeetConfig::default();
        config.client.chat_url = "http://localhost:3000".into();
        assert!(validate(&config).is_err());

        config.client.chat_url = "wss://".into();
        assert!(validate(&config).is_err());

        config.client.chat_url = "wss://chat.example.org".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn signaling_url_accepts_http_and_ws() {
        let mut config = MeetConfig::default();
        config.client.signaling_url = "wss://signal.example.org".into();
        assert!(validate(&config).is_ok());

        config.client.signaling_url = "ftp://signal.example.org".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn ice_server_scheme_checked() {
        let mut config = MeetConfig::default();
        config.client.ice_servers = vec!["turn:turn.example.org:3478".into()];
        assert!(validate(&config).is_ok());

        config.client.ice_servers.push("stun.example.org".into());
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
