//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod client;
mod logging;
mod relay;

pub use client::*;
pub use logging::*;
pub use relay::*;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the relay binary and the meeting client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetConfig {
    pub relay: RelayConfig,
    pub client: ClientConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}
