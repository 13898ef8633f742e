//! The session pool — a concurrent map from identifier to session,
//! shared between every request task and the housekeeping sweep.
//!
//! Touches happen under the dashmap shard guard and evictions re-check
//! staleness under the shard write lock, so a session touched before the
//! sweep observes it is retained, and one touched after is simply
//! recreated on its next request. Neither outcome loses a touch mid-scan.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

use bazaar_core::{Session, SharedClock};

use super::Sweeper;

pub struct SessionPool {
    sessions: DashMap<String, Arc<Session>>,
    timeout: Duration,
    clock: SharedClock,
    /// Held for the duration of one eviction scan. `try_lock` keeps two
    /// sweeps of the same pool from ever running against each other.
    sweep_lock: Mutex<()>,
}

impl SessionPool {
    pub fn new(timeout: Duration, clock: SharedClock) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
            clock,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Look up a session. A hit stamps `last_accessed` with the current
    /// clock time. An expired-but-unswept id is a miss — the entry is
    /// dropped on the spot so no stale session is ever handed out.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let now = self.clock.now();
        if self
            .sessions
            .remove_if(id, |_, s| s.is_stale(now, self.timeout))
            .is_some()
        {
            return None;
        }
        let entry = self.sessions.get(id)?;
        entry.value().touch(now);
        Some(Arc::clone(entry.value()))
    }

    /// Create a fresh session with a random identifier and empty
    /// attributes. Insertion goes through the vacant entry, so a session
    /// is either fully present or absent — never half-initialized.
    pub fn create(&self) -> Arc<Session> {
        loop {
            let id = generate_id();
            match self.sessions.entry(id.clone()) {
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    let session = Arc::new(Session::new(id, self.clock.now()));
                    slot.insert(Arc::clone(&session));
                    return session;
                }
                // 128-bit collision. Roll again.
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
            }
        }
    }

    /// Explicit removal (logout). Removing an absent id is a no-op.
    pub fn expire(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Remove every session idle for at least the configured timeout,
    /// as judged at `now`. Returns the number removed. Safe to call
    /// concurrently with `get`/`create`/`expire`; a concurrent call to
    /// `evict_expired` itself is skipped rather than overlapped.
    pub fn evict_expired(&self, now: SystemTime) -> usize {
        let _guard = match self.sweep_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return 0,
        };
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            if session.is_stale(now, self.timeout) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Sweeper for SessionPool {
    fn sweep(&self, now: SystemTime) -> anyhow::Result<usize> {
        Ok(self.evict_expired(now))
    }
}

/// 16 bytes from the OS RNG, hex-encoded. Unguessable, never sequential.
fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
