use crate::connection::{LinkEvent, LinkTag, PeerConnector};
use crate::error::ClientError;
use crate::link::{ApplyOutcome, PeerLink, Role};
use crate::media::{LocalMedia, MediaCapture, MediaKind};
use crate::session::{ChatLog, SessionCommand};
use huddle_core::{ClientEvent, Participant, RoomId, ServerEvent, SessionId, SignalPayload};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const LINK_EVENT_CAPACITY: usize = 256;

/// Display name for a remote whose offer arrived before its join notice.
pub const UNKNOWN_PARTICIPANT: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room_id: RoomId,
    pub session_id: SessionId,
    pub display_name: String,
}

/// One participant's view of a call: a link per remote session, local media,
/// and the room chat.
pub struct PeerSession {
    config: SessionConfig,
    links: HashMap<SessionId, PeerLink>,
    connector: Arc<dyn PeerConnector>,
    media: LocalMedia,
    chat: ChatLog,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    link_tx: mpsc::Sender<LinkEvent>,
    next_generation: u64,
}

impl PeerSession {
    /// Acquire local media, then ask the relay to join the room.
    ///
    /// Nothing is sent when capture fails. The returned receiver carries the
    /// events of every link this session opens.
    pub async fn join(
        config: SessionConfig,
        capture: &dyn MediaCapture,
        connector: Arc<dyn PeerConnector>,
        outbound: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<(Self, mpsc::Receiver<LinkEvent>), ClientError> {
        let media = capture.acquire().await.inspect_err(|e| {
            error!("Cannot join room {}: {}", config.room_id, e);
        })?;

        outbound
            .send(ClientEvent::JoinRoom {
                room_id: config.room_id,
                session_id: config.session_id,
                display_name: config.display_name.clone(),
            })
            .map_err(|_| ClientError::RelayClosed)?;

        info!(
            "Joining room {} as {} ({})",
            config.room_id, config.display_name, config.session_id
        );

        let (link_tx, link_rx) = mpsc::channel(LINK_EVENT_CAPACITY);
        let session = Self {
            config,
            links: HashMap::new(),
            connector,
            media,
            chat: ChatLog::new(),
            outbound,
            link_tx,
            next_generation: 0,
        };
        Ok((session, link_rx))
    }

    pub fn session_id(&self) -> SessionId {
        self.config.session_id
    }

    pub fn room_id(&self) -> RoomId {
        self.config.room_id
    }

    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }

    pub fn link(&self, remote: &SessionId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    pub fn links(&self) -> impl Iterator<Item = &PeerLink> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub async fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::IceConfig { ice_servers } => {
                debug!("Relay offered {} ICE server(s)", ice_servers.len());
                self.connector.update_ice_servers(ice_servers).await;
            }

            ServerEvent::RoomCreated { room_id } => {
                debug!("Room {} created", room_id);
            }

            ServerEvent::AllUsers { users } => {
                info!("Room {} roster: {} other member(s)", self.config.room_id, users.len());
                for user in users {
                    self.add_link(user, Role::Initiator).await;
                }
            }

            ServerEvent::UserConnected(user) => {
                self.add_link(user, Role::Responder).await;
            }

            ServerEvent::Signal { from, payload } => {
                self.handle_signal(from, payload).await;
            }

            ServerEvent::UserDisconnected { session_id } => {
                self.remove_link(&session_id, "remote left").await;
            }

            ServerEvent::ReceiveMessage(message) => {
                let id = message.id;
                let line = format!("{}: {}", message.sender_name, message.content);
                if self.chat.record(message) {
                    info!("[chat] {}", line);
                } else {
                    debug!("Dropping redelivered chat message {}", id);
                }
            }

            ServerEvent::Error { reason } => {
                warn!("Relay refused a request: {}", reason);
            }
        }
    }

    /// Events from a connection that has since been replaced are ignored.
    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        let tag = event.tag();
        let Some(link) = self.current_link_mut(&tag) else {
            debug!("Dropping event from stale link to {}", tag.remote);
            return;
        };

        match event {
            LinkEvent::LocalCandidate(_, candidate) => {
                if !link.state().is_closed() {
                    self.send_signal(tag.remote, SignalPayload::Candidate(candidate));
                }
            }

            LinkEvent::Connected(_) => {
                link.mark_connected();
            }

            LinkEvent::RemoteTrack(_, track) => {
                info!("Receiving {} from {}", track.kind, tag.remote);
                link.add_remote_track(track);
            }

            LinkEvent::Failed(_, reason) => {
                warn!("Link to {} failed: {}", tag.remote, reason);
                self.remove_link(&tag.remote, "transport failure").await;
            }

            LinkEvent::Closed(_) => {
                self.remove_link(&tag.remote, "transport closed").await;
            }
        }
    }

    /// Relay a chat line to the room as typed. Blank lines are dropped locally.
    pub fn send_chat(&self, content: &str) -> Result<(), ClientError> {
        if content.trim().is_empty() {
            return Ok(());
        }
        self.outbound
            .send(ClientEvent::SendMessage {
                content: content.to_owned(),
            })
            .map_err(|_| ClientError::RelayClosed)
    }

    /// Mute or unmute local tracks of `kind` on every link. Returns the new
    /// state, or `None` when nothing of that kind is captured.
    pub async fn toggle_media(&mut self, kind: MediaKind) -> Option<bool> {
        let enabled = self.media.toggle(kind)?;
        info!(
            "Local {} {}",
            kind,
            if enabled { "resumed" } else { "muted" }
        );

        for link in self.links.values() {
            if let Err(e) = link.set_track_enabled(kind, enabled).await {
                warn!(
                    "Could not switch {} towards {}: {}",
                    kind,
                    link.remote().session_id,
                    e
                );
            }
        }
        Some(enabled)
    }

    /// Close every link, stop local capture and tell the relay.
    pub async fn leave(mut self) {
        info!("Leaving room {}", self.config.room_id);

        let remotes: Vec<SessionId> = self.links.keys().copied().collect();
        for remote in remotes {
            self.remove_link(&remote, "local leave").await;
        }
        self.media.release();

        if self.outbound.send(ClientEvent::LeaveRoom).is_err() {
            debug!("Relay already gone while leaving");
        }
    }

    /// Drive the session until the user leaves or the relay goes away.
    pub async fn run(
        mut self,
        mut link_events: mpsc::Receiver<LinkEvent>,
        mut inbound: mpsc::UnboundedReceiver<ServerEvent>,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) {
        loop {
            tokio::select! {
                event = inbound.recv() => match event {
                    Some(event) => self.handle_server_event(event).await,
                    None => {
                        warn!("Relay connection lost, leaving room {}", self.config.room_id);
                        break;
                    }
                },

                Some(event) = link_events.recv() => {
                    self.handle_link_event(event).await;
                }

                command = commands.recv() => match command {
                    Some(SessionCommand::SendChat(content)) => {
                        if let Err(e) = self.send_chat(&content) {
                            warn!("Chat not sent: {}", e);
                        }
                    }
                    Some(SessionCommand::ToggleAudio) => {
                        if self.toggle_media(MediaKind::Audio).await.is_none() {
                            warn!("No local audio to toggle");
                        }
                    }
                    Some(SessionCommand::ToggleVideo) => {
                        if self.toggle_media(MediaKind::Video).await.is_none() {
                            warn!("No local video to toggle");
                        }
                    }
                    Some(SessionCommand::Leave) | None => break,
                },
            }
        }

        self.leave().await;
    }

    async fn handle_signal(&mut self, from: SessionId, payload: SignalPayload) {
        if !self.links.contains_key(&from) {
            if !matches!(payload, SignalPayload::Offer { .. }) {
                debug!("Dropping {} from {}, no link", payload.kind(), from);
                return;
            }
            info!("Offer from {} before its join notice", from);
            self.add_link(Participant::new(from, UNKNOWN_PARTICIPANT), Role::Responder)
                .await;
        }

        let Some(link) = self.links.get_mut(&from) else {
            return;
        };

        match link.apply(payload).await {
            Ok(ApplyOutcome::Answered(answer)) => self.send_signal(from, answer),
            Ok(ApplyOutcome::Applied) | Ok(ApplyOutcome::Duplicate) => {}
            Ok(ApplyOutcome::Rejected(reason)) => {
                debug!("Signal from {} rejected: {}", from, reason);
            }
            Err(e) => {
                warn!("Negotiation with {} failed: {}", from, e);
                self.remove_link(&from, "negotiation failure").await;
            }
        }
    }

    async fn add_link(&mut self, remote: Participant, role: Role) {
        if remote.session_id == self.config.session_id {
            return;
        }
        if let Some(link) = self.links.get_mut(&remote.session_id) {
            debug!("Link to {} already exists", remote.session_id);
            link.set_display_name(remote.display_name);
            return;
        }

        let remote_id = remote.session_id;
        let generation = self.next_generation;
        self.next_generation += 1;
        let tag = LinkTag {
            remote: remote_id,
            generation,
        };

        let connection = match self
            .connector
            .open(tag, &self.media, self.link_tx.clone())
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Could not open a connection to {}: {}", remote_id, e);
                return;
            }
        };

        let mut link = PeerLink::new(generation, remote, role, connection);
        match link.start().await {
            Ok(offer) => {
                self.links.insert(remote_id, link);
                if let Some(offer) = offer {
                    self.send_signal(remote_id, offer);
                }
            }
            Err(e) => {
                warn!("Negotiation with {} failed to start: {}", remote_id, e);
                link.close().await;
            }
        }
    }

    fn current_link_mut(&mut self, tag: &LinkTag) -> Option<&mut PeerLink> {
        self.links
            .get_mut(&tag.remote)
            .filter(|link| link.tag() == *tag)
    }

    async fn remove_link(&mut self, remote: &SessionId, reason: &str) {
        if let Some(mut link) = self.links.remove(remote) {
            link.close().await;
            info!("Link to {} removed ({})", remote, reason);
        }
    }

    fn send_signal(&self, to: SessionId, payload: SignalPayload) {
        if self
            .outbound
            .send(ClientEvent::Signal { to, payload })
            .is_err()
        {
            warn!("Relay connection closed, signal to {} lost", to);
        }
    }
}
