use huddle_core::{Participant, RoomId, SessionId};

/// Membership record owned by the room a session belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub room_id: RoomId,
    pub display_name: String,
}

impl Session {
    pub fn participant(&self) -> Participant {
        Participant::new(self.session_id, self.display_name.clone())
    }
}
