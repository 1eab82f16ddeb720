//! Transcript relay
//!
//! Single slot, last write wins. Readers only see a transcript while it is
//! younger than the freshness window.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use voice_shop_config::constants::session;
use voice_shop_core::Transcript;

pub struct TranscriptRelay {
    slot: Mutex<Option<Transcript>>,
    freshness: Duration,
}

impl Default for TranscriptRelay {
    fn default() -> Self {
        Self::new(Duration::seconds(session::TRANSCRIPT_FRESHNESS_SECS as i64))
    }
}

impl TranscriptRelay {
    pub fn new(freshness: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            freshness,
        }
    }

    pub fn from_settings(settings: &voice_shop_config::SessionConfig) -> Self {
        Self::new(Duration::seconds(settings.transcript_freshness_secs as i64))
    }

    /// Store a transcript, replacing whatever was there
    pub fn record(&self, transcript: Transcript) {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.as_ref() {
            tracing::trace!(
                previous_turn = %previous.turn_id,
                turn_id = %transcript.turn_id,
                "Overwriting relayed transcript"
            );
        }
        *slot = Some(transcript);
    }

    /// Latest transcript if still fresh
    pub fn fetch_latest(&self) -> Option<Transcript> {
        self.fetch_latest_at(Utc::now())
    }

    pub fn fetch_latest_at(&self, now: DateTime<Utc>) -> Option<Transcript> {
        self.slot
            .lock()
            .as_ref()
            .filter(|t| t.is_fresh_at(now, self.freshness))
            .cloned()
    }
}
