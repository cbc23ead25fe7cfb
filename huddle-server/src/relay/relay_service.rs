use crate::config::RelayConfig;
use crate::relay::{ConnectionTable, Dispatcher};
use crate::room::RoomDirectory;
use huddle_core::{IceServerConfig, ServerEvent, SessionId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Relay state shared by every connection: the live connection table and
/// the room directory that publishes through it.
#[derive(Clone)]
pub struct RelayService {
    connections: ConnectionTable,
    directory: RoomDirectory,
    config: Arc<RelayConfig>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        let connections = ConnectionTable::default();
        let directory = RoomDirectory::new(Arc::new(connections.clone()), &config);

        Self {
            connections,
            directory,
            config: Arc::new(config),
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.config.ice_servers.clone()
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Register a connection for `session_id` and hand back its dispatcher
    /// together with the stream of events addressed to it.
    pub fn connect(&self, session_id: SessionId) -> (Dispatcher, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.connections.register(session_id, tx);

        self.connections.deliver(
            &session_id,
            ServerEvent::IceConfig {
                ice_servers: self.ice_servers(),
            },
        );

        (Dispatcher::new(session_id, token, self.clone()), rx)
    }

    /// Forward an addressed negotiation payload unchanged. A target without
    /// a live connection is not an error: the payload is dropped and `false`
    /// returned.
    pub fn relay_signal(&self, envelope: SignalEnvelope) -> bool {
        let SignalEnvelope { from, to, payload } = envelope;
        let kind = payload.kind();
        let delivered = self
            .connections
            .deliver(&to, ServerEvent::Signal { from, payload });

        if delivered {
            debug!("Relayed {} from {} to {}", kind, from, to);
        } else {
            debug!("Dropped {} from {}: {} is gone", kind, from, to);
        }
        delivered
    }
}
