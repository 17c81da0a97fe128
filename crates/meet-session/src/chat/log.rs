//! Session-local chat history.
//!
//! A bounded ring buffer so memory stays predictable. Nothing is persisted;
//! the log dies with the session.

use std::collections::VecDeque;

use meet_common::ChatMessage;

use crate::config::SessionConfig;

#[derive(Debug)]
pub struct ChatLog {
    limit: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            messages: VecDeque::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.chat_history_limit)
    }

    /// Append a message, evicting the oldest when full.
    pub fn push(&mut self, msg: ChatMessage) {
        if self.messages.len() >= self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<&ChatMessage> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).collect()
    }

    pub fn all(&self) -> Vec<&ChatMessage> {
        self.messages.iter().collect()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(500)
    }
}
