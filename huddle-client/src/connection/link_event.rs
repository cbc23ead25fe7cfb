use huddle_core::{IceCandidate, SessionId};

/// Identifies one connection towards a remote session. A remote that leaves
/// and rejoins gets a new generation, so events from the old connection can
/// be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkTag {
    pub remote: SessionId,
    pub generation: u64,
}

/// A remote media track that started arriving on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: String,
}

/// Events a peer connection reports back to the session that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Local ICE candidate to forward to the remote session.
    LocalCandidate(LinkTag, IceCandidate),
    /// Media path established.
    Connected(LinkTag),
    RemoteTrack(LinkTag, RemoteTrack),
    Failed(LinkTag, String),
    Closed(LinkTag),
}

impl LinkEvent {
    pub fn tag(&self) -> LinkTag {
        match self {
            LinkEvent::LocalCandidate(tag, _)
            | LinkEvent::Connected(tag)
            | LinkEvent::RemoteTrack(tag, _)
            | LinkEvent::Failed(tag, _)
            | LinkEvent::Closed(tag) => *tag,
        }
    }

    pub fn remote(&self) -> SessionId {
        self.tag().remote
    }
}
