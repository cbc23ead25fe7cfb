use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Negotiation message exchanged between two sessions through the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate(IceCandidate),
}

impl SignalPayload {
    /// Content key used to recognise a redelivered payload.
    pub fn fingerprint(&self) -> Fingerprint {
        let key = match self {
            SignalPayload::Offer { sdp } => format!("offer:{sdp}"),
            SignalPayload::Answer { sdp } => format!("answer:{sdp}"),
            SignalPayload::Candidate(c) => format!(
                "candidate:{}|{}|{}",
                c.candidate,
                c.sdp_mid.as_deref().unwrap_or_default(),
                c.sdp_m_line_index.map(|i| i.to_string()).unwrap_or_default()
            ),
        };
        Fingerprint(key)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer { .. } => "offer",
            SignalPayload::Answer { .. } => "answer",
            SignalPayload::Candidate(_) => "candidate",
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Addressed negotiation message. Never persisted; the relay forwards it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub from: SessionId,
    pub to: SessionId,
    pub payload: SignalPayload,
}
