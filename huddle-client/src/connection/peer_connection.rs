use crate::connection::{LinkEvent, LinkTag};
use crate::error::NegotiationError;
use crate::media::{LocalMedia, MediaKind};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDescription {
    Offer(String),
    Answer(String),
}

/// One transport connection to one remote session.
///
/// `generate_offer` and `generate_answer` also install the produced
/// description locally.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn generate_offer(&self) -> Result<String, NegotiationError>;

    async fn apply_remote_description(
        &self,
        description: RemoteDescription,
    ) -> Result<(), NegotiationError>;

    async fn generate_answer(&self) -> Result<String, NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    /// Stop or resume sending the local tracks of `kind`.
    async fn set_track_enabled(
        &self,
        _kind: MediaKind,
        _enabled: bool,
    ) -> Result<(), NegotiationError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError>;
}

/// Opens peer connections that report through a shared event channel.
///
/// Every event of a connection carries the `tag` it was opened with.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn open(
        &self,
        tag: LinkTag,
        media: &LocalMedia,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError>;

    /// Replace the ICE servers used by connections opened from now on.
    async fn update_ice_servers(&self, _ice_servers: Vec<IceServerConfig>) {}
}
