use async_trait::async_trait;
use huddle_core::{ServerEvent, SessionId};

/// Outbound side of the relay, as seen by the room actors.
#[async_trait]
pub trait EventOutput: Send + Sync {
    /// Deliver `event` to the live connection of `session_id`.
    ///
    /// Returns `false` when the session has no connection; the event is
    /// discarded in that case.
    async fn send_event(&self, session_id: &SessionId, event: ServerEvent) -> bool;
}
