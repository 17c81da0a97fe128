//! Room chat over the chat relay.

mod client;
mod log;

pub use client::{ChatClient, ChatEvent, ChatIdentity, NOT_CONNECTED_NOTICE};
pub use log::ChatLog;
