//! Events exchanged between a client and the relay over the signaling channel.

use crate::model::{ChatMessage, IceServerConfig, Participant, RoomId, SessionId, SignalPayload};
use serde::{Deserialize, Serialize};

/// Client → relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientEvent {
    CreateRoom,
    JoinRoom {
        room_id: RoomId,
        session_id: SessionId,
        display_name: String,
    },
    Signal {
        to: SessionId,
        payload: SignalPayload,
    },
    SendMessage {
        content: String,
    },
    LeaveRoom,
}

/// Relay → client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerEvent {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    RoomCreated {
        room_id: RoomId,
    },
    /// Snapshot of the other members, sent to the joiner only.
    AllUsers {
        users: Vec<Participant>,
    },
    UserConnected(Participant),
    Signal {
        from: SessionId,
        payload: SignalPayload,
    },
    UserDisconnected {
        session_id: SessionId,
    },
    ReceiveMessage(ChatMessage),
    Error {
        reason: String,
    },
}
