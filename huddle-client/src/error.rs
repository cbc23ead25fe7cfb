use thiserror::Error;

/// Local capture could not be started. Fatal to the call view; the user
/// retries by hand.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no capture device available: {0}")]
    Unavailable(String),

    #[error("permission to capture was denied")]
    PermissionDenied,
}

/// The underlying connection of one link reported an error.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("rejected by transport: {0}")]
    Rejected(String),

    #[error("connection already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("relay connection closed")]
    RelayClosed,

    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed relay event: {0}")]
    Json(#[from] serde_json::Error),
}
