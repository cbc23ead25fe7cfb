use huddle_core::IceServerConfig;

/// Relay settings shared by every connection and room.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Handed to each client on connect for its peer connections.
    pub ice_servers: Vec<IceServerConfig>,
    /// Bound of each room actor's command queue.
    pub room_command_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::default()],
            room_command_capacity: 100,
        }
    }
}
