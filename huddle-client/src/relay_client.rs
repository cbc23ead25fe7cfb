use crate::error::ClientError;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEvent, IceServerConfig, RoomId, ServerEvent, SessionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket connection from one session to the relay.
pub struct RelayConnection {
    session_id: SessionId,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<ServerEvent>,
    ice_servers: Option<Vec<IceServerConfig>>,
    writer: JoinHandle<()>,
}

/// The channels of a [`RelayConnection`] handed to a session.
pub struct RelayParts {
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub inbound: mpsc::UnboundedReceiver<ServerEvent>,
    /// Finishes once every outbound sender is dropped and the queued events
    /// are flushed and the socket closed.
    pub writer: JoinHandle<()>,
}

impl RelayConnection {
    /// Connect to `{base_url}/ws/{session_id}`, e.g. `ws://127.0.0.1:5000`.
    pub async fn connect(base_url: &str, session_id: SessionId) -> Result<Self, ClientError> {
        let url = format!("{}/ws/{}", base_url.trim_end_matches('/'), session_id);
        let (socket, _) = connect_async(url.as_str()).await?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerEvent>();

        let writer = tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {:?}: {}", event, e);
                        continue;
                    }
                };
                if sink.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if inbound_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Malformed relay event: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Relay reader finished");
        });

        Ok(Self {
            session_id,
            outbound,
            inbound,
            ice_servers: None,
            writer,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// ICE servers announced by the relay, once seen.
    pub fn ice_servers(&self) -> Option<&[IceServerConfig]> {
        self.ice_servers.as_deref()
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), ClientError> {
        self.outbound.send(event).map_err(|_| ClientError::RelayClosed)
    }

    pub async fn recv(&mut self) -> Option<ServerEvent> {
        let event = self.inbound.recv().await?;
        if let ServerEvent::IceConfig { ice_servers } = &event {
            self.ice_servers = Some(ice_servers.clone());
        }
        Some(event)
    }

    /// Ask the relay for a fresh room id.
    pub async fn create_room(&mut self) -> Result<RoomId, ClientError> {
        self.send(ClientEvent::CreateRoom)?;

        loop {
            match self.recv().await {
                Some(ServerEvent::RoomCreated { room_id }) => return Ok(room_id),
                Some(other) => debug!("Skipping {:?} while waiting for a room id", other),
                None => return Err(ClientError::RelayClosed),
            }
        }
    }

    /// Flush anything queued, then close the socket.
    pub async fn close(self) {
        drop(self.outbound);
        let _ = self.writer.await;
    }

    /// Hand the channels to a session. Dropping the sender closes the socket.
    pub fn into_parts(self) -> RelayParts {
        RelayParts {
            outbound: self.outbound,
            inbound: self.inbound,
            writer: self.writer,
        }
    }
}
