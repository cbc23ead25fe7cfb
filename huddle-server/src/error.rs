use huddle_core::{RoomId, SessionId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("session {0} is not a member of any room")]
    NotInRoom(SessionId),

    #[error("room {0} shut down before the request was handled")]
    RoomClosed(RoomId),
}
