//! A single client's session: identifier, attribute bag, access stamp.
//!
//! Sessions are shared between concurrent request handlers and the pool's
//! eviction sweep, so the access stamp is an atomic and the attribute bag
//! sits behind its own lock. Attribute races between two requests holding
//! the same session are last-write-wins — the pool does not arbitrate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

/// Per-client state tracked by the session pool.
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: SystemTime,
    /// Millis since the epoch of the last pool lookup that returned this
    /// session. Atomic so a touch and the eviction scan never tear.
    last_accessed: AtomicU64,
    attributes: Mutex<HashMap<String, Value>>,
}

impl Session {
    pub fn new(id: String, now: SystemTime) -> Self {
        Self {
            id,
            created_at: now,
            last_accessed: AtomicU64::new(epoch_millis(now)),
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Opaque identifier, immutable for the session's lifetime.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Stamp the session as accessed at `now`.
    pub fn touch(&self, now: SystemTime) {
        self.last_accessed
            .store(epoch_millis(now), Ordering::Relaxed);
    }

    pub fn last_accessed(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.last_accessed.load(Ordering::Relaxed))
    }

    /// True once the session has sat idle for `timeout` or longer.
    /// The boundary is inclusive: idle exactly `timeout` means stale.
    pub fn is_stale(&self, now: SystemTime, timeout: Duration) -> bool {
        match now.duration_since(self.last_accessed()) {
            Ok(idle) => idle >= timeout,
            // Access stamp is in the future (clock moved back) — not stale.
            Err(_) => false,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: Value) {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value);
    }

    pub fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn touch_updates_access_stamp() {
        let session = Session::new("abc".into(), at(10));
        assert_eq!(session.last_accessed(), at(10));

        session.touch(at(25));
        assert_eq!(session.last_accessed(), at(25));
        assert_eq!(session.created_at(), at(10));
    }

    #[test]
    fn staleness_boundary_is_inclusive() {
        let timeout = Duration::from_secs(2);
        let session = Session::new("abc".into(), at(100));

        assert!(!session.is_stale(at(101), timeout));
        assert!(session.is_stale(at(102), timeout));
        assert!(session.is_stale(at(103), timeout));
    }

    #[test]
    fn clock_moving_backwards_never_reports_stale() {
        let session = Session::new("abc".into(), at(100));
        assert!(!session.is_stale(at(50), Duration::from_secs(1)));
    }

    #[test]
    fn attributes_last_write_wins() {
        let session = Session::new("abc".into(), at(0));

        session.set_attribute("cart", json!(["apple"]));
        session.set_attribute("cart", json!(["apple", "pear"]));
        assert_eq!(session.attribute("cart"), Some(json!(["apple", "pear"])));

        assert_eq!(session.remove_attribute("cart"), Some(json!(["apple", "pear"])));
        assert_eq!(session.attribute("cart"), None);
        assert_eq!(session.attribute_count(), 0);
    }
}
