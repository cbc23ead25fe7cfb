use crate::relay::EventOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ServerEvent, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identifies one registration of a session, so a socket that closes after
/// its session reconnected elsewhere cannot unregister the newer socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionToken(u64);

struct Connection {
    token: ConnectionToken,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct ConnectionsInner {
    connections: DashMap<SessionId, Connection>,
    next_token: AtomicU64,
}

/// Live outbound channel per connected session.
#[derive(Clone, Default)]
pub struct ConnectionTable {
    inner: Arc<ConnectionsInner>,
}

impl ConnectionTable {
    pub fn register(
        &self,
        session_id: SessionId,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> ConnectionToken {
        let token = ConnectionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        let previous = self
            .inner
            .connections
            .insert(session_id, Connection { token, tx });
        if previous.is_some() {
            info!("Session {} reconnected, replacing its old connection", session_id);
        }
        token
    }

    /// Returns `true` if `token` was still the session's current connection.
    pub fn unregister(&self, session_id: &SessionId, token: ConnectionToken) -> bool {
        self.inner
            .connections
            .remove_if(session_id, |_, conn| conn.token == token)
            .is_some()
    }

    pub fn is_connected(&self, session_id: &SessionId) -> bool {
        self.inner.connections.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.connections.is_empty()
    }

    pub fn deliver(&self, session_id: &SessionId, event: ServerEvent) -> bool {
        let Some(conn) = self.inner.connections.get(session_id) else {
            debug!("No live connection for {}, dropping event", session_id);
            return false;
        };
        if conn.tx.send(event).is_err() {
            warn!("Outbound channel of {} is closed", session_id);
            return false;
        }
        true
    }
}

#[async_trait]
impl EventOutput for ConnectionTable {
    async fn send_event(&self, session_id: &SessionId, event: ServerEvent) -> bool {
        self.deliver(session_id, event)
    }
}
