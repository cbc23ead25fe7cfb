use crate::utils::FakeConnector;
use huddle_client::{LinkEvent, LinkState, PeerSession, ReceiveOnlyCapture, Role, SessionConfig};
use huddle_core::{ClientEvent, RoomId, ServerEvent, SessionId};
use huddle_server::{Dispatcher, RelayConfig, RelayService};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A session wired to an in-process relay through channels.
pub struct MeshPeer {
    pub session: PeerSession,
    pub connector: FakeConnector,
    dispatcher: Dispatcher,
    server_rx: mpsc::UnboundedReceiver<ServerEvent>,
    client_rx: mpsc::UnboundedReceiver<ClientEvent>,
    link_rx: mpsc::Receiver<LinkEvent>,
}

impl MeshPeer {
    pub fn session_id(&self) -> SessionId {
        self.session.session_id()
    }

    pub fn role_towards(&self, remote: &MeshPeer) -> Option<Role> {
        self.session.link(&remote.session_id()).map(|l| l.role())
    }

    pub fn state_towards(&self, remote: &MeshPeer) -> Option<LinkState> {
        self.session.link(&remote.session_id()).map(|l| l.state())
    }

    /// Move everything queued one hop. Returns whether anything moved.
    async fn pump(&mut self) -> bool {
        let mut progressed = false;

        while let Ok(event) = self.client_rx.try_recv() {
            self.dispatcher.dispatch(event).await;
            progressed = true;
        }
        while let Ok(event) = self.server_rx.try_recv() {
            self.session.handle_server_event(event).await;
            progressed = true;
        }
        while let Ok(event) = self.link_rx.try_recv() {
            self.session.handle_link_event(event).await;
            progressed = true;
        }

        progressed
    }
}

/// Several sessions in one process, exchanging events through a real
/// `RelayService` until every queue is empty.
pub struct Mesh {
    relay: RelayService,
    pub room_id: RoomId,
    pub peers: Vec<MeshPeer>,
}

impl Mesh {
    pub fn new() -> Self {
        let relay = RelayService::new(RelayConfig::default());
        let room_id = relay.directory().create_room();
        Self {
            relay,
            room_id,
            peers: Vec::new(),
        }
    }

    pub fn relay(&self) -> &RelayService {
        &self.relay
    }

    /// Join a new participant without settling. Returns its index.
    pub async fn join_unsettled(&mut self, display_name: &str) -> usize {
        let session_id = SessionId::new();
        let (dispatcher, server_rx) = self.relay.connect(session_id);
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let connector = FakeConnector::new(session_id);

        let config = SessionConfig {
            room_id: self.room_id,
            session_id,
            display_name: display_name.to_owned(),
        };
        let (session, link_rx) = PeerSession::join(
            config,
            &ReceiveOnlyCapture,
            Arc::new(connector.clone()),
            client_tx,
        )
        .await
        .expect("Failed to join");

        self.peers.push(MeshPeer {
            session,
            connector,
            dispatcher,
            server_rx,
            client_rx,
            link_rx,
        });
        self.peers.len() - 1
    }

    pub async fn join(&mut self, display_name: &str) -> usize {
        let index = self.join_unsettled(display_name).await;
        self.settle().await;
        index
    }

    /// Pump until no queue has anything left.
    pub async fn settle(&mut self) {
        loop {
            let mut progressed = false;
            for peer in &mut self.peers {
                progressed |= peer.pump().await;
            }
            if !progressed {
                break;
            }
        }
    }

    /// Pump one participant once.
    pub async fn step(&mut self, index: usize) -> bool {
        self.peers[index].pump().await
    }

    /// Graceful leave: the session closes its links and tells the relay.
    pub async fn leave(&mut self, index: usize) -> FakeConnector {
        let mut peer = self.peers.remove(index);
        peer.session.leave().await;
        while let Ok(event) = peer.client_rx.try_recv() {
            peer.dispatcher.dispatch(event).await;
        }
        peer.dispatcher.disconnect().await;
        self.settle().await;
        peer.connector
    }

    /// Transport loss: the relay notices the socket is gone, the session
    /// never says goodbye.
    pub async fn drop_connection(&mut self, index: usize) -> FakeConnector {
        let peer = self.peers.remove(index);
        peer.dispatcher.disconnect().await;
        self.settle().await;
        peer.connector
    }
}
