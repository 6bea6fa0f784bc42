use crate::api::delivery::DeliveryPayload;
use crate::core::constants::PEER_STALE_AFTER;
use crate::util::error::{BngError, Result};
use std::time::{Duration, Instant};

/// The receiving peer's view of the most recent delivery.
///
/// A peer polls [`needs_refresh`](PeerView::needs_refresh) on its own clock
/// and sends a position request whenever it returns `true`.
#[derive(Debug, Clone)]
pub struct PeerView {
    last: Option<DeliveryPayload>,
    last_response: Option<Instant>,
    stale_after: Duration,
}

impl Default for PeerView {
    fn default() -> Self {
        Self {
            last: None,
            last_response: None,
            stale_after: PEER_STALE_AFTER,
        }
    }
}

impl PeerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn payload(&self) -> Option<&DeliveryPayload> {
        self.last.as_ref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.last.as_ref().map(|p| p.bng.as_str())
    }

    /// Records a delivered payload received at `now`.
    pub fn apply(&mut self, payload: DeliveryPayload, now: Instant) {
        self.last = Some(payload);
        self.last_response = Some(now);
    }

    /// Records a payload received as JSON.
    pub fn apply_json(&mut self, json: &str, now: Instant) -> Result<()> {
        let payload: DeliveryPayload =
            serde_json::from_str(json).map_err(|e| BngError::Serialization(e.to_string()))?;
        self.apply(payload, now);
        Ok(())
    }

    /// Whether the peer should ask for a fresh position.
    ///
    /// True with no reference yet, with a blank placeholder reference, or
    /// once the last response is older than the staleness window.
    pub fn needs_refresh(&self, now: Instant) -> bool {
        let blank = self
            .reference()
            .is_none_or(|r| r.is_empty() || r.starts_with(' '));
        if blank {
            return true;
        }
        match self.last_response {
            Some(at) => now.saturating_duration_since(at) > self.stale_after,
            None => true,
        }
    }
}
