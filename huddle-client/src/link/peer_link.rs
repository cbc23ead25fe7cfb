use crate::connection::{LinkTag, PeerConnection, RemoteDescription, RemoteTrack};
use crate::error::NegotiationError;
use crate::link::{LinkState, Role, SignalFilter};
use crate::media::MediaKind;
use huddle_core::{Participant, SignalPayload};
use tracing::{debug, info, warn};

/// What applying an inbound payload did to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Seen before, dropped without touching the connection.
    Duplicate,
    Applied,
    /// An offer was applied; the answer must be relayed back.
    Answered(SignalPayload),
    /// Not valid for this link's role or state. The link is unchanged.
    Rejected(&'static str),
}

/// Negotiation state of the connection to one remote session.
pub struct PeerLink {
    generation: u64,
    remote: Participant,
    role: Role,
    state: LinkState,
    filter: SignalFilter,
    remote_tracks: Vec<RemoteTrack>,
    connection: Box<dyn PeerConnection>,
}

impl PeerLink {
    pub fn new(
        generation: u64,
        remote: Participant,
        role: Role,
        connection: Box<dyn PeerConnection>,
    ) -> Self {
        Self {
            generation,
            remote,
            role,
            state: LinkState::Idle,
            filter: SignalFilter::new(),
            remote_tracks: Vec::new(),
            connection,
        }
    }

    pub fn remote(&self) -> &Participant {
        &self.remote
    }

    /// Tag carried by the events of this link's connection.
    pub fn tag(&self) -> LinkTag {
        LinkTag {
            remote: self.remote.session_id,
            generation: self.generation,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn remote_tracks(&self) -> &[RemoteTrack] {
        &self.remote_tracks
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.remote.display_name = display_name.into();
    }

    fn transition(&mut self, next: LinkState) {
        if self.state != next {
            info!(
                "Link to {} ({:?}): {:?} -> {:?}",
                self.remote.session_id, self.role, self.state, next
            );
            self.state = next;
        }
    }

    /// Leave `Idle`. An initiator returns its offer, which the caller relays.
    pub async fn start(&mut self) -> Result<Option<SignalPayload>, NegotiationError> {
        if self.state != LinkState::Idle {
            return Ok(None);
        }

        match self.role {
            Role::Initiator => {
                self.transition(LinkState::Offering);
                let sdp = self.connection.generate_offer().await?;
                self.transition(LinkState::Negotiating);
                Ok(Some(SignalPayload::Offer { sdp }))
            }
            Role::Responder => {
                self.transition(LinkState::AwaitingOffer);
                Ok(None)
            }
        }
    }

    /// Apply an inbound payload from the remote session.
    ///
    /// An `Err` means the connection refused a description; the link is no
    /// longer usable and the caller should close and drop it.
    pub async fn apply(&mut self, payload: SignalPayload) -> Result<ApplyOutcome, NegotiationError> {
        if self.state.is_closed() {
            return Ok(ApplyOutcome::Rejected("link is closed"));
        }
        let fingerprint = payload.fingerprint();
        if self.filter.is_applied(&fingerprint) {
            debug!(
                "Dropping duplicate {} from {}",
                payload.kind(),
                self.remote.session_id
            );
            return Ok(ApplyOutcome::Duplicate);
        }

        let outcome = self.apply_new(payload).await?;
        if matches!(outcome, ApplyOutcome::Applied | ApplyOutcome::Answered(_)) {
            self.filter.record(fingerprint);
        }
        Ok(outcome)
    }

    async fn apply_new(&mut self, payload: SignalPayload) -> Result<ApplyOutcome, NegotiationError> {
        match payload {
            SignalPayload::Offer { sdp } => {
                if self.role == Role::Initiator {
                    warn!(
                        "Offer from {} ignored, this side initiates",
                        self.remote.session_id
                    );
                    return Ok(ApplyOutcome::Rejected("offer sent to initiator"));
                }

                self.connection
                    .apply_remote_description(RemoteDescription::Offer(sdp))
                    .await?;
                let answer = self.connection.generate_answer().await?;
                if self.state == LinkState::AwaitingOffer {
                    self.transition(LinkState::Negotiating);
                }
                Ok(ApplyOutcome::Answered(SignalPayload::Answer { sdp: answer }))
            }

            SignalPayload::Answer { sdp } => {
                if self.role == Role::Responder {
                    warn!(
                        "Answer from {} ignored, this side responds",
                        self.remote.session_id
                    );
                    return Ok(ApplyOutcome::Rejected("answer sent to responder"));
                }

                self.connection
                    .apply_remote_description(RemoteDescription::Answer(sdp))
                    .await?;
                Ok(ApplyOutcome::Applied)
            }

            SignalPayload::Candidate(candidate) => {
                match self.connection.add_ice_candidate(candidate).await {
                    Ok(()) => Ok(ApplyOutcome::Applied),
                    Err(e) => {
                        warn!(
                            "Candidate from {} refused: {}",
                            self.remote.session_id, e
                        );
                        Ok(ApplyOutcome::Rejected("candidate refused"))
                    }
                }
            }
        }
    }

    /// The transport reports a live media path. Only a negotiating link moves.
    pub fn mark_connected(&mut self) -> bool {
        if self.state != LinkState::Negotiating {
            return false;
        }
        self.transition(LinkState::Connected);
        true
    }

    pub async fn set_track_enabled(
        &self,
        kind: MediaKind,
        enabled: bool,
    ) -> Result<(), NegotiationError> {
        if self.state.is_closed() {
            return Ok(());
        }
        self.connection.set_track_enabled(kind, enabled).await
    }

    pub fn add_remote_track(&mut self, track: RemoteTrack) {
        if !self.remote_tracks.contains(&track) {
            self.remote_tracks.push(track);
        }
    }

    /// Terminal. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.transition(LinkState::Closed);
        self.remote_tracks.clear();

        if let Err(e) = self.connection.close().await {
            warn!(
                "Closing connection to {} failed: {}",
                self.remote.session_id, e
            );
        }
    }
}
