/// Which side of a link sends the offer. Fixed for the lifetime of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The session that joined later; it learned about the remote from the roster.
    Initiator,
    /// The session that was already in the room.
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Offering,
    AwaitingOffer,
    Negotiating,
    Connected,
    Closed,
}

impl LinkState {
    pub fn is_closed(self) -> bool {
        self == LinkState::Closed
    }
}
