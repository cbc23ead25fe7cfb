use crate::error::DirectoryError;
use crate::relay::{ConnectionToken, RelayService};
use huddle_core::{ClientEvent, ServerEvent, SessionId, SignalEnvelope};
use tracing::{info, warn};

/// Routes the events of one client connection. Room and session state is
/// looked up per event, so repeated joins never stack handlers.
pub struct Dispatcher {
    session_id: SessionId,
    token: ConnectionToken,
    relay: RelayService,
}

impl Dispatcher {
    pub(crate) fn new(session_id: SessionId, token: ConnectionToken, relay: RelayService) -> Self {
        Self {
            session_id,
            token,
            relay,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn dispatch(&self, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom => {
                let room_id = self.relay.directory().create_room();
                self.reply(ServerEvent::RoomCreated { room_id });
            }

            ClientEvent::JoinRoom {
                room_id,
                session_id,
                display_name,
            } => {
                if session_id != self.session_id {
                    warn!(
                        "Connection {} tried to join as {}",
                        self.session_id, session_id
                    );
                    self.reply(ServerEvent::Error {
                        reason: "session id does not match this connection".into(),
                    });
                    return;
                }

                if let Err(e) = self
                    .relay
                    .directory()
                    .join(room_id, session_id, display_name)
                    .await
                {
                    warn!("Join of {} into {} failed: {}", session_id, room_id, e);
                    self.reply(ServerEvent::Error {
                        reason: e.to_string(),
                    });
                }
            }

            ClientEvent::Signal { to, payload } => {
                self.relay.relay_signal(SignalEnvelope {
                    from: self.session_id,
                    to,
                    payload,
                });
            }

            ClientEvent::SendMessage { content } => {
                match self
                    .relay
                    .directory()
                    .send_chat(self.session_id, content)
                    .await
                {
                    Ok(_) => {}
                    Err(DirectoryError::NotInRoom(_)) => {
                        warn!("Chat from {} ignored, not in a room", self.session_id);
                    }
                    Err(e) => warn!("Chat from {} failed: {}", self.session_id, e),
                }
            }

            ClientEvent::LeaveRoom => {
                self.relay.directory().leave(&self.session_id).await;
            }
        }
    }

    /// Transport went away. Leaves the room unless a newer connection of the
    /// same session has taken over.
    pub async fn disconnect(self) {
        if self
            .relay
            .connections()
            .unregister(&self.session_id, self.token)
        {
            self.relay.directory().leave(&self.session_id).await;
            info!("Session {} disconnected", self.session_id);
        } else {
            info!(
                "Stale connection of {} closed, newer connection kept",
                self.session_id
            );
        }
    }

    fn reply(&self, event: ServerEvent) {
        self.relay.connections().deliver(&self.session_id, event);
    }
}
