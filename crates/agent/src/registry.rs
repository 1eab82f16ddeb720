//! Session registry
//!
//! Owns all per-session state: the welcome flag, the last transcript, the
//! last product shown, recently processed transcript signatures and the
//! async lock that serializes a session's events.
//!
//! Sessions idle for longer than the welcome TTL are forgotten. The registry
//! never tracks more than `max_sessions`; when full, expired sessions are
//! purged first and then the least recently active ones.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use voice_shop_config::constants::session;
use voice_shop_core::{Product, Transcript, TranscriptSignature};

/// Registry limits
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Inactivity after which a session (and its welcome) is forgotten
    pub welcome_ttl: Duration,
    pub max_sessions: usize,
    /// Window in which a repeated transcript signature is a duplicate
    pub duplicate_window: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            welcome_ttl: Duration::seconds(session::WELCOME_TTL_SECS as i64),
            max_sessions: session::MAX_SESSIONS,
            duplicate_window: Duration::seconds(session::TRANSCRIPT_FRESHNESS_SECS as i64),
        }
    }
}

impl RegistryConfig {
    pub fn from_settings(settings: &voice_shop_config::SessionConfig) -> Self {
        Self {
            welcome_ttl: Duration::seconds(settings.welcome_ttl_secs as i64),
            max_sessions: settings.max_sessions.max(1),
            duplicate_window: Duration::seconds(settings.transcript_freshness_secs as i64),
        }
    }
}

/// Where a session is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn in progress
    #[default]
    Idle,
    /// Welcomed, waiting for the first utterance
    AwaitTurn,
    /// A turn is being processed
    StreamingTurn,
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub id: String,
    pub welcomed: bool,
    pub state: TurnState,
    pub last_transcript: Option<Transcript>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub last_product: Option<Product>,
}

struct SessionEntry {
    welcomed: bool,
    state: TurnState,
    last_active: DateTime<Utc>,
    last_transcript: Option<Transcript>,
    last_processed_at: Option<DateTime<Utc>>,
    last_product: Option<Product>,
    processed: HashMap<TranscriptSignature, DateTime<Utc>>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl SessionEntry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            welcomed: false,
            state: TurnState::Idle,
            last_active: now,
            last_transcript: None,
            last_processed_at: None,
            last_product: None,
            processed: HashMap::new(),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Forget everything but the lock
    fn reset(&mut self, now: DateTime<Utc>) {
        let lock = Arc::clone(&self.lock);
        *self = Self::new(now);
        self.lock = lock;
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_active) >= ttl
    }

    /// Someone holds or waits on the session lock
    fn is_busy(&self) -> bool {
        Arc::strong_count(&self.lock) > 1
    }

    fn snapshot(&self, id: &str) -> SessionSnapshot {
        SessionSnapshot {
            id: id.to_string(),
            welcomed: self.welcomed,
            state: self.state,
            last_transcript: self.last_transcript.clone(),
            last_processed_at: self.last_processed_at,
            last_product: self.last_product.clone(),
        }
    }
}

/// In-memory session registry
pub struct SessionRegistry {
    config: RegistryConfig,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Run `f` on the live entry for `id`, creating it if needed
    fn with_entry<R>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut SessionEntry) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock();

        if !sessions.contains_key(id) && sessions.len() >= self.config.max_sessions {
            self.make_room(&mut sessions, now);
        }

        let entry = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionEntry::new(now));
        if entry.is_expired(now, self.config.welcome_ttl) {
            tracing::debug!(session_id = id, "Session expired, starting fresh");
            entry.reset(now);
        }
        entry.last_active = now;
        f(entry)
    }

    /// Evict expired, then least recently active, sessions
    ///
    /// Busy sessions are never evicted, so the registry may stay over
    /// capacity until their turns finish.
    fn make_room(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_busy() || !entry.is_expired(now, self.config.welcome_ttl));

        while sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, entry)| !entry.is_busy())
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        if sessions.len() >= self.config.max_sessions {
            tracing::warn!(
                sessions = sessions.len(),
                max_sessions = self.config.max_sessions,
                "Session registry over capacity, all sessions busy"
            );
        }
        tracing::info!(
            evicted = before - sessions.len(),
            remaining = sessions.len(),
            "Session registry at capacity"
        );
    }

    /// Lock serializing event processing for a session
    pub fn session_lock(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.with_entry(id, Utc::now(), |entry| Arc::clone(&entry.lock))
    }

    /// Mark the session welcomed; `true` only the first time
    pub fn try_welcome(&self, id: &str) -> bool {
        self.try_welcome_at(id, Utc::now())
    }

    pub fn try_welcome_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        self.with_entry(id, now, |entry| {
            let first = !entry.welcomed;
            entry.welcomed = true;
            if first {
                entry.state = TurnState::AwaitTurn;
            }
            first
        })
    }

    /// Record a transcript signature; `false` if it was already seen within
    /// the duplicate window
    pub fn mark_processed(&self, transcript: &Transcript) -> bool {
        self.mark_processed_at(transcript, Utc::now())
    }

    pub fn mark_processed_at(&self, transcript: &Transcript, now: DateTime<Utc>) -> bool {
        let window = self.config.duplicate_window;
        self.with_entry(&transcript.session_id, now, |entry| {
            entry
                .processed
                .retain(|_, seen| now.signed_duration_since(*seen) < window);

            let signature = transcript.signature();
            if entry.processed.contains_key(&signature) {
                return false;
            }
            entry.processed.insert(signature, now);
            entry.last_transcript = Some(transcript.clone());
            entry.last_processed_at = Some(now);
            true
        })
    }

    pub fn set_state(&self, id: &str, state: TurnState) {
        self.with_entry(id, Utc::now(), |entry| entry.state = state);
    }

    pub fn remember_product(&self, id: &str, product: Product) {
        self.with_entry(id, Utc::now(), |entry| entry.last_product = Some(product));
    }

    pub fn last_product(&self, id: &str) -> Option<Product> {
        self.with_entry(id, Utc::now(), |entry| entry.last_product.clone())
    }

    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        self.sessions.lock().get(id).map(|entry| entry.snapshot(id))
    }

    /// Drop a session entirely
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(max_sessions: usize) -> SessionRegistry {
        SessionRegistry::new(RegistryConfig {
            max_sessions,
            ..RegistryConfig::default()
        })
    }

    #[test]
    fn test_welcome_once() {
        let reg = SessionRegistry::default();
        assert!(reg.try_welcome("s1"));
        assert!(!reg.try_welcome("s1"));
        assert!(!reg.try_welcome("s1"));
        assert!(reg.try_welcome("s2"));

        let snapshot = reg.snapshot("s1").unwrap();
        assert!(snapshot.welcomed);
        assert_eq!(snapshot.state, TurnState::AwaitTurn);
    }

    #[test]
    fn test_welcome_expires_after_ttl() {
        let reg = SessionRegistry::default();
        let start = Utc::now();
        assert!(reg.try_welcome_at("s1", start));
        assert!(!reg.try_welcome_at("s1", start + Duration::minutes(29)));
        // Activity at 29 minutes pushes expiry out
        assert!(!reg.try_welcome_at("s1", start + Duration::minutes(58)));
        assert!(reg.try_welcome_at("s1", start + Duration::minutes(90)));
    }

    #[test]
    fn test_capacity_evicts_least_recently_active() {
        let reg = registry(3);
        let start = Utc::now();
        reg.try_welcome_at("a", start);
        reg.try_welcome_at("b", start + Duration::seconds(1));
        reg.try_welcome_at("c", start + Duration::seconds(2));
        // Touch "a" so "b" becomes the oldest
        reg.try_welcome_at("a", start + Duration::seconds(3));

        reg.try_welcome_at("d", start + Duration::seconds(4));
        assert_eq!(reg.len(), 3);
        assert!(reg.contains("a"));
        assert!(!reg.contains("b"));
        assert!(reg.contains("d"));
    }

    #[test]
    fn test_capacity_purges_expired_first() {
        let reg = registry(2);
        let start = Utc::now();
        reg.try_welcome_at("old", start);
        reg.try_welcome_at("recent", start + Duration::minutes(40));

        reg.try_welcome_at("new", start + Duration::minutes(41));
        assert!(!reg.contains("old"));
        assert!(reg.contains("recent"));
        assert!(reg.contains("new"));
    }

    #[test]
    fn test_duplicate_signatures_within_window() {
        let reg = SessionRegistry::default();
        let now = Utc::now();
        let first = Transcript::received("Show me  Cloud shoes", "s1", "t1", now);
        let repeat = Transcript::received("show me cloud shoes", "s1", "t1", now);

        assert!(reg.mark_processed_at(&first, now));
        assert!(!reg.mark_processed_at(&repeat, now + Duration::seconds(3)));
        assert!(reg.mark_processed_at(&repeat, now + Duration::seconds(15)));

        let other_turn = Transcript::received("show me cloud shoes", "s1", "t2", now);
        assert!(reg.mark_processed_at(&other_turn, now + Duration::seconds(16)));

        let snapshot = reg.snapshot("s1").unwrap();
        assert_eq!(snapshot.last_transcript.map(|t| t.turn_id), Some("t2".to_string()));
        assert!(snapshot.last_processed_at.is_some());
    }

    #[test]
    fn test_last_product_and_remove() {
        let reg = SessionRegistry::default();
        assert!(reg.last_product("s1").is_none());
        reg.remember_product("s1", Product::new(3, "Speed Pro", 120.0));
        assert_eq!(reg.last_product("s1").map(|p| p.id), Some(3));

        assert!(reg.remove("s1"));
        assert!(!reg.remove("s1"));
        assert!(reg.snapshot("s1").is_none());
    }

    #[tokio::test]
    async fn test_session_lock_is_shared() {
        let reg = SessionRegistry::default();
        let a = reg.session_lock("s1");
        let b = reg.session_lock("s1");
        assert!(Arc::ptr_eq(&a, &b));

        let _guard = a.lock().await;
        assert!(b.try_lock().is_err());
        assert!(reg.session_lock("s2").try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_capacity_keeps_busy_sessions() {
        let reg = registry(1);
        let held = reg.session_lock("s1");
        let guard = held.lock().await;
        assert!(reg.try_welcome("s1"));

        // s1 is mid-event, so the cap is overshot instead of evicting it
        assert!(reg.try_welcome("s2"));
        assert_eq!(reg.len(), 2);
        assert!(Arc::ptr_eq(&held, &reg.session_lock("s1")));
        assert!(reg.session_lock("s1").try_lock().is_err());
        assert!(!reg.try_welcome("s1"));

        drop(guard);
        drop(held);
        assert!(reg.try_welcome("s3"));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("s3"));
    }
}
