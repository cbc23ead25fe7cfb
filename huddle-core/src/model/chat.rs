use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub is_link: bool,
}

impl ChatMessage {
    /// Mint a new message id and timestamp for `content` sent by `sender_name`.
    pub fn stamp(sender_name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4(),
            sender_name: sender_name.into(),
            timestamp: Utc::now(),
            is_link: content.starts_with("http://") || content.starts_with("https://"),
            content,
        }
    }
}
