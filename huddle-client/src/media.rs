use crate::error::DeviceError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn of(track: &dyn TrackLocal) -> Option<Self> {
        match track.kind() {
            RTPCodecType::Audio => Some(MediaKind::Audio),
            RTPCodecType::Video => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// Captured local media, shared by every peer connection of a session.
pub struct LocalMedia {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    on_release: Option<ReleaseHook>,
    audio_enabled: bool,
    video_enabled: bool,
    released: bool,
}

impl LocalMedia {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            tracks,
            on_release: None,
            audio_enabled: true,
            video_enabled: true,
            released: false,
        }
    }

    /// No local tracks; connections only receive.
    pub fn receive_only() -> Self {
        Self::new(Vec::new())
    }

    /// Run `hook` once when capture is released, e.g. to stop the devices.
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }

    pub fn is_receive_only(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.tracks
            .iter()
            .any(|track| MediaKind::of(track.as_ref()) == Some(kind))
    }

    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio_enabled,
            MediaKind::Video => self.video_enabled,
        }
    }

    /// Flip whether tracks of `kind` are sent. Returns the new state, or
    /// `None` when no local track of that kind was captured.
    pub fn toggle(&mut self, kind: MediaKind) -> Option<bool> {
        if self.released || !self.has_kind(kind) {
            return None;
        }
        let enabled = match kind {
            MediaKind::Audio => &mut self.audio_enabled,
            MediaKind::Video => &mut self.video_enabled,
        };
        *enabled = !*enabled;
        Some(*enabled)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop local capture. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        info!("Releasing local media ({} track(s))", self.tracks.len());
        self.tracks.clear();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl Drop for LocalMedia {
    fn drop(&mut self) {
        self.release();
    }
}

/// Source of local media for a call.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, DeviceError>;
}

/// Capture for headless participants that only watch.
pub struct ReceiveOnlyCapture;

#[async_trait]
impl MediaCapture for ReceiveOnlyCapture {
    async fn acquire(&self) -> Result<LocalMedia, DeviceError> {
        Ok(LocalMedia::receive_only())
    }
}
