use serde::{Deserialize, Serialize};

/// Chat relay server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// TCP port the relay listens on.
    pub port: u16,
    pub bind_address: String,
    /// Outbound queue depth per connection. Frames beyond it are dropped.
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".into(),
            channel_capacity: 256,
        }
    }
}

impl RelayConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
