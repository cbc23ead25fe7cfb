use huddle_core::ChatMessage;
use std::collections::HashSet;
use uuid::Uuid;

/// Chat messages received in the current room, in arrival order.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    ids: HashSet<Uuid>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if a message with the same id is already logged.
    pub fn record(&mut self, message: ChatMessage) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
