mod chat;
mod ice;
mod room;
mod session;
mod signaling;

pub use chat::ChatMessage;
pub use ice::{DEFAULT_STUN_ADDR, IceServerConfig};
pub use room::RoomId;
pub use session::{Participant, SessionId};
pub use signaling::{Fingerprint, IceCandidate, SignalEnvelope, SignalPayload};
