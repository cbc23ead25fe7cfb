use crate::connection::{
    LinkEvent, LinkTag, PeerConnection, PeerConnector, RemoteDescription, RemoteTrack,
};
use crate::error::NegotiationError;
use crate::media::{LocalMedia, MediaKind};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Opens real WebRTC peer connections.
pub struct WebRtcConnector {
    ice_servers: RwLock<Vec<IceServerConfig>>,
}

impl WebRtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            ice_servers: RwLock::new(ice_servers),
        }
    }

    async fn rtc_configuration(&self) -> RTCConfiguration {
        let ice_servers = self
            .ice_servers
            .read()
            .await
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect();

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

impl Default for WebRtcConnector {
    fn default() -> Self {
        Self::new(vec![IceServerConfig::default()])
    }
}

fn build_api() -> Result<API, NegotiationError> {
    let mut m = MediaEngine::default();
    m.register_default_codecs()?;
    let registry = register_default_interceptors(Registry::new(), &mut m)?;

    Ok(APIBuilder::new()
        .with_media_engine(m)
        .with_interceptor_registry(registry)
        .build())
}

#[async_trait]
impl PeerConnector for WebRtcConnector {
    async fn open(
        &self,
        tag: LinkTag,
        media: &LocalMedia,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError> {
        let remote = tag.remote;
        let api = build_api()?;
        let peer_connection = Arc::new(api.new_peer_connection(self.rtc_configuration().await).await?);

        let mut senders = Vec::new();
        if media.is_receive_only() {
            for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
                peer_connection
                    .add_transceiver_from_kind(
                        kind,
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await?;
            }
        } else {
            for track in media.tracks() {
                let sender = peer_connection.add_track(Arc::clone(track)).await?;
                let kind = MediaKind::of(track.as_ref());
                if kind.is_some_and(|kind| !media.is_enabled(kind)) {
                    sender.replace_track(None).await?;
                }
                senders.push(LocalSender {
                    kind,
                    sender,
                    track: Arc::clone(track),
                });
            }
        }

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state for {} changed: {:?}", remote, s);
                    // Disconnected may still recover; only Failed and Closed end a link.
                    let event = match s {
                        RTCPeerConnectionState::Connected => Some(LinkEvent::Connected(tag)),
                        RTCPeerConnectionState::Failed => {
                            Some(LinkEvent::Failed(tag, "ice negotiation failed".to_string()))
                        }
                        RTCPeerConnectionState::Closed => Some(LinkEvent::Closed(tag)),
                        _ => None,
                    };
                    if let Some(event) = event {
                        let _ = tx.send(event).await;
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(LinkEvent::LocalCandidate(tag, candidate)).await;
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    let remote_track = RemoteTrack {
                        id: track.id(),
                        kind: track.kind().to_string(),
                    };
                    debug!("Remote {} track {} from {}", remote_track.kind, remote_track.id, remote);
                    let _ = tx.send(LinkEvent::RemoteTrack(tag, remote_track)).await;
                })
            },
        ));

        Ok(Box::new(WebRtcConnection {
            tag,
            peer_connection,
            senders,
        }))
    }

    async fn update_ice_servers(&self, ice_servers: Vec<IceServerConfig>) {
        debug!("Using {} ICE server(s) for new connections", ice_servers.len());
        *self.ice_servers.write().await = ice_servers;
    }
}

struct LocalSender {
    kind: Option<MediaKind>,
    sender: Arc<RTCRtpSender>,
    track: Arc<dyn TrackLocal + Send + Sync>,
}

pub struct WebRtcConnection {
    tag: LinkTag,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Vec<LocalSender>,
}

#[async_trait]
impl PeerConnection for WebRtcConnection {
    async fn generate_offer(&self) -> Result<String, NegotiationError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn apply_remote_description(
        &self,
        description: RemoteDescription,
    ) -> Result<(), NegotiationError> {
        let desc = match description {
            RemoteDescription::Offer(sdp) => RTCSessionDescription::offer(sdp)?,
            RemoteDescription::Answer(sdp) => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn generate_answer(&self) -> Result<String, NegotiationError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn set_track_enabled(
        &self,
        kind: MediaKind,
        enabled: bool,
    ) -> Result<(), NegotiationError> {
        for local in self.senders.iter().filter(|s| s.kind == Some(kind)) {
            let track = enabled.then(|| Arc::clone(&local.track));
            if let Err(e) = local.sender.replace_track(track).await {
                warn!(
                    "Could not switch {} for {}: {}",
                    kind, self.tag.remote, e
                );
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        debug!("Closing peer connection to {}", self.tag.remote);
        self.peer_connection.close().await?;
        Ok(())
    }
}
