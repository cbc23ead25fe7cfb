use crate::error::DirectoryError;
use huddle_core::{ChatMessage, Participant, SessionId};
use tokio::sync::oneshot;

/// Requests serialized through a room's actor.
#[derive(Debug)]
pub enum RoomCommand {
    /// Register (or re-register) a session and reply with the other members.
    Join {
        session_id: SessionId,
        display_name: String,
        reply: oneshot::Sender<Result<Vec<Participant>, DirectoryError>>,
    },

    /// Remove a session; replies with the number of members left.
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<usize>,
    },

    /// Stamp and broadcast a chat message to every member.
    Chat {
        session_id: SessionId,
        content: String,
        reply: oneshot::Sender<Option<ChatMessage>>,
    },
}
