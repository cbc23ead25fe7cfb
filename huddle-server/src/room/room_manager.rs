use crate::config::RelayConfig;
use crate::error::DirectoryError;
use crate::relay::EventOutput;
use crate::room::room::Room;
use crate::room::room_command::RoomCommand;
use dashmap::DashMap;
use huddle_core::{ChatMessage, Participant, RoomId, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct RoomHandle {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
    pub(crate) instance: u64,
}

/// Authoritative membership table: which rooms are live and which room each
/// session is in.
#[derive(Clone)]
pub struct RoomDirectory {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    memberships: Arc<DashMap<SessionId, RoomId>>,
    output: Arc<dyn EventOutput>,
    next_instance: Arc<AtomicU64>,
    command_capacity: usize,
}

impl RoomDirectory {
    pub fn new(output: Arc<dyn EventOutput>, config: &RelayConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            output,
            next_instance: Arc::new(AtomicU64::new(0)),
            command_capacity: config.room_command_capacity.max(1),
        }
    }

    /// Mint a fresh room id. The room itself comes alive on first join.
    pub fn create_room(&self) -> RoomId {
        let room_id = RoomId::new();
        info!("Minted room {}", room_id);
        room_id
    }

    /// Register `session_id` in `room_id` and return the other members.
    ///
    /// The roster is delivered to the joiner before any existing member is
    /// told about the join. Joining a different room leaves the current one.
    pub async fn join(
        &self,
        room_id: RoomId,
        session_id: SessionId,
        display_name: String,
    ) -> Result<Vec<Participant>, DirectoryError> {
        let current = self.room_of(&session_id);
        if current.is_some_and(|r| r != room_id) {
            self.leave(&session_id).await;
        }

        loop {
            let handle = self.room_handle(room_id);
            let (reply, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                session_id,
                display_name: display_name.clone(),
                reply,
            };

            if handle.tx.send(cmd).await.is_err() {
                self.rooms
                    .remove_if(&room_id, |_, h| h.instance == handle.instance);
                debug!("Room {} went away during join, retrying", room_id);
                continue;
            }

            match reply_rx.await {
                Ok(Ok(roster)) => {
                    self.memberships.insert(session_id, room_id);
                    return Ok(roster);
                }
                Ok(Err(DirectoryError::RoomClosed(_))) | Err(_) => {
                    debug!("Room {} closed during join, retrying", room_id);
                }
                Ok(Err(e)) => return Err(e),
            }
        }
    }

    /// Remove the session from its room. Returns `false` if it was in none.
    pub async fn leave(&self, session_id: &SessionId) -> bool {
        let Some((_, room_id)) = self.memberships.remove(session_id) else {
            return false;
        };
        let Some(handle) = self.live_handle(&room_id) else {
            return true;
        };

        let (reply, reply_rx) = oneshot::channel();
        let cmd = RoomCommand::Leave {
            session_id: *session_id,
            reply,
        };
        if handle.tx.send(cmd).await.is_ok() {
            if let Ok(remaining) = reply_rx.await {
                debug!("Room {} has {} member(s) left", room_id, remaining);
            }
        }
        true
    }

    /// Stamp and broadcast a chat message to the sender's room.
    ///
    /// Blank content is ignored and yields `Ok(None)`.
    pub async fn send_chat(
        &self,
        session_id: SessionId,
        content: String,
    ) -> Result<Option<ChatMessage>, DirectoryError> {
        if content.trim().is_empty() {
            debug!("Ignoring blank chat message from {}", session_id);
            return Ok(None);
        }

        let room_id = self
            .room_of(&session_id)
            .ok_or(DirectoryError::NotInRoom(session_id))?;
        let handle = self
            .live_handle(&room_id)
            .ok_or(DirectoryError::NotInRoom(session_id))?;

        let (reply, reply_rx) = oneshot::channel();
        let cmd = RoomCommand::Chat {
            session_id,
            content,
            reply,
        };
        handle
            .tx
            .send(cmd)
            .await
            .map_err(|_| DirectoryError::RoomClosed(room_id))?;
        reply_rx.await.map_err(|_| DirectoryError::RoomClosed(room_id))
    }

    pub fn room_of(&self, session_id: &SessionId) -> Option<RoomId> {
        self.memberships.get(session_id).map(|r| *r)
    }

    pub fn is_live(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn live_handle(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|h| h.clone())
    }

    fn room_handle(&self, room_id: RoomId) -> RoomHandle {
        self.rooms
            .entry(room_id)
            .or_insert_with(|| self.spawn_room(room_id))
            .clone()
    }

    fn spawn_room(&self, room_id: RoomId) -> RoomHandle {
        info!("Creating new room: {}", room_id);
        let (tx, rx) = mpsc::channel(self.command_capacity);
        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);

        let room = Room::new(
            room_id,
            instance,
            rx,
            self.output.clone(),
            self.rooms.clone(),
        );
        tokio::spawn(room.run());

        RoomHandle { tx, instance }
    }
}
