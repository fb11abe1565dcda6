use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use super::Session;

/// Idle time after which a session is swept (1 hour).
pub const SESSION_TTL_SECS: i64 = 3600;

/// An opportunistic sweep runs on every Nth session creation.
pub const SWEEP_EVERY_CREATIONS: u64 = 100;

/// In-memory session table, sharded by session id.
///
/// Requests for different sessions never contend on a single lock. Two concurrent
/// requests for the same session each work on their own copy and the later commit
/// wins.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    creations: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it if unknown, and refresh its last activity.
    pub fn get_or_create(&self, id: &str) -> Session {
        self.get_or_create_at(id, Utc::now())
    }

    /// [`get_or_create`](Self::get_or_create) with an explicit clock.
    pub fn get_or_create_at(&self, id: &str, now: DateTime<Utc>) -> Session {
        let mut created = false;
        let snapshot = {
            let mut entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
                created = true;
                Session::new(id, now)
            });
            entry.last_activity = now;
            entry.clone()
        };

        if created {
            debug!(session_id = %id, "Session created");
            // The entry guard is released above; sweeping under it would deadlock.
            let count = self.creations.fetch_add(1, Ordering::Relaxed) + 1;
            if count % SWEEP_EVERY_CREATIONS == 0 {
                self.sweep_at(now);
            }
        }
        snapshot
    }

    /// Write back a session copy. Last write wins.
    pub fn commit(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Drop ended sessions and sessions idle longer than the TTL.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// [`sweep`](Self::sweep) with an explicit clock. Returns the number removed.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - TimeDelta::seconds(SESSION_TTL_SECS);
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.ended && session.last_activity >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "Swept sessions");
        }
        removed
    }

    /// Spawn a background task that sweeps every `interval`.
    ///
    /// The task runs until the runtime shuts down or the handle is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_creates_once() {
        let store = SessionStore::new();
        let first = store.get_or_create("s1");
        assert_eq!(first.id, "s1");
        assert_eq!(first.turns, 0);

        let mut updated = first.clone();
        updated.record_turn("halo", 5);
        store.commit(updated);

        let again = store.get_or_create("s1");
        assert_eq!(again.turns, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn access_refreshes_last_activity() {
        let store = SessionStore::new();
        let t0 = Utc::now();
        store.get_or_create_at("s1", t0);
        let later = t0 + TimeDelta::minutes(30);
        assert_eq!(store.get_or_create_at("s1", later).last_activity, later);
    }

    #[test]
    fn commit_is_last_write_wins() {
        let store = SessionStore::new();
        let mut a = store.get_or_create("s1");
        let mut b = store.get_or_create("s1");

        a.record_turn("satu", 5);
        a.record_turn("dua", 5);
        b.record_turn("tiga", 5);

        store.commit(a);
        store.commit(b);
        assert_eq!(store.get_or_create("s1").turns, 1);
    }

    #[test]
    fn sweep_removes_idle_and_ended_sessions() {
        let store = SessionStore::new();
        let now = Utc::now();

        store.get_or_create_at("idle", now - TimeDelta::hours(2));
        store.get_or_create_at("fresh", now);
        let mut ended = store.get_or_create_at("ended", now);
        ended.end();
        store.commit(ended);

        assert_eq!(store.sweep_at(now), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_or_create_at("fresh", now).id, "fresh");
    }

    #[test]
    fn swept_session_comes_back_empty() {
        let store = SessionStore::new();
        let now = Utc::now();
        let mut s = store.get_or_create_at("s1", now);
        s.record_turn("halo", 5);
        s.end();
        store.commit(s);

        store.sweep_at(now);
        let fresh = store.get_or_create_at("s1", now);
        assert!(!fresh.ended);
        assert_eq!(fresh.turns, 0);
    }

    #[test]
    fn every_hundredth_creation_sweeps() {
        let store = SessionStore::new();
        let now = Utc::now();
        let stale = now - TimeDelta::hours(3);

        store.get_or_create_at("old", stale);
        for i in 1..SWEEP_EVERY_CREATIONS - 1 {
            store.get_or_create_at(&format!("s{i}"), now);
        }
        assert_eq!(store.len() as u64, SWEEP_EVERY_CREATIONS - 1);

        // The 100th creation triggers the sweep that drops "old".
        store.get_or_create_at("trigger", now);
        assert_eq!(store.len() as u64, SWEEP_EVERY_CREATIONS - 1);
    }

    #[tokio::test]
    async fn background_sweeper_runs_on_interval() {
        let store = SessionStore::new();
        let mut s = store.get_or_create("s1");
        s.end();
        store.commit(s);

        let handle = store.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
        handle.abort();
    }
}
