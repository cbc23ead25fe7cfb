use huddle_core::{Fingerprint, SignalPayload};
use std::collections::HashSet;

/// Remembers every payload applied to a link so redelivered ones are dropped.
///
/// Only successfully applied payloads are recorded; a refused one may be
/// delivered again later and applied then.
#[derive(Debug, Default)]
pub struct SignalFilter {
    seen: HashSet<Fingerprint>,
}

impl SignalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applied(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Returns `false` if the fingerprint was already recorded.
    pub fn record(&mut self, fingerprint: Fingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
