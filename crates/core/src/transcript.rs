//! Transcripts delivered by the voice transport

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A finalized user utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub session_id: String,
    pub turn_id: String,
    pub received_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript stamped with the current time
    pub fn new(
        text: impl Into<String>,
        session_id: impl Into<String>,
        turn_id: impl Into<String>,
    ) -> Self {
        Self::received(text, session_id, turn_id, Utc::now())
    }

    pub fn received(
        text: impl Into<String>,
        session_id: impl Into<String>,
        turn_id: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            turn_id: turn_id.into(),
            received_at,
        }
    }

    /// Whether the transcript is strictly younger than `window` at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.received_at) < window
    }

    pub fn signature(&self) -> TranscriptSignature {
        TranscriptSignature::new(&self.session_id, &self.turn_id, &self.text)
    }
}

/// Identity of a transcript for duplicate suppression
///
/// Text is compared case-insensitively with whitespace runs collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranscriptSignature {
    session_id: String,
    turn_id: String,
    text: String,
}

impl TranscriptSignature {
    pub fn new(session_id: &str, turn_id: &str, text: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            turn_id: turn_id.to_string(),
            text: text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundary() {
        let t0 = Utc::now();
        let transcript = Transcript::received("hi", "s1", "t1", t0);
        let window = Duration::seconds(10);

        assert!(transcript.is_fresh_at(t0, window));
        assert!(transcript.is_fresh_at(t0 + Duration::milliseconds(9_999), window));
        assert!(!transcript.is_fresh_at(t0 + Duration::seconds(10), window));
        assert!(!transcript.is_fresh_at(t0 + Duration::seconds(60), window));
    }

    #[test]
    fn test_signature_normalizes_text() {
        let a = TranscriptSignature::new("s1", "t1", "Show me  Running shoes");
        let b = TranscriptSignature::new("s1", "t1", "show me running shoes ");
        assert_eq!(a, b);

        let other_turn = TranscriptSignature::new("s1", "t2", "show me running shoes");
        assert_ne!(a, other_turn);
    }
}
