//! Credential-scoped response cache.
//!
//! The original Skoola web client flushed stale data on account switch by
//! reloading the whole page. Here the invalidation is explicit: entries are
//! keyed by `(user_id, path)` and an account switch drops every entry owned
//! by the outgoing credential, so cached responses never straddle two
//! identities.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default freshness window for cached responses.
pub const DEFAULT_TTL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    user_id: String,
    path: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    value: serde_json::Value,
}

/// TTL cache over JSON responses, keyed per credential.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh cached response for this credential and path, if any.
    /// Expired entries are dropped on access.
    pub fn get(&self, user_id: &str, path: &str) -> Option<serde_json::Value> {
        let key = CacheKey {
            user_id: user_id.to_string(),
            path: path.to_string(),
        };
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            entries.remove(&key);
        }
        None
    }

    pub fn put(&self, user_id: &str, path: &str, value: serde_json::Value) {
        let key = CacheKey {
            user_id: user_id.to_string(),
            path: path.to_string(),
        };
        self.entries.lock().insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    /// Drop every entry owned by one credential. Called on account switch
    /// and on removal of a stored identity.
    pub fn invalidate_user(&self, user_id: &str) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| key.user_id != user_id);
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(user_id = %user_id, dropped, "invalidated cached responses");
        }
    }

    /// Drop everything (full logout).
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_returns_fresh_entries() {
        let cache = ResponseCache::default();
        cache.put("u1", "/classes", json!({"items": []}));

        assert_eq!(cache.get("u1", "/classes"), Some(json!({"items": []})));
        assert_eq!(cache.get("u1", "/students"), None);
    }

    #[test]
    fn entries_are_scoped_per_credential() {
        let cache = ResponseCache::default();
        cache.put("u1", "/classes", json!(1));
        cache.put("u2", "/classes", json!(2));

        assert_eq!(cache.get("u1", "/classes"), Some(json!(1)));
        assert_eq!(cache.get("u2", "/classes"), Some(json!(2)));
    }

    #[test]
    fn invalidate_user_drops_only_that_credential() {
        let cache = ResponseCache::default();
        cache.put("u1", "/classes", json!(1));
        cache.put("u1", "/students", json!(1));
        cache.put("u2", "/classes", json!(2));

        cache.invalidate_user("u1");

        assert_eq!(cache.get("u1", "/classes"), None);
        assert_eq!(cache.get("u1", "/students"), None);
        assert_eq!(cache.get("u2", "/classes"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_dropped_on_access() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.put("u1", "/classes", json!(1));

        assert_eq!(cache.get("u1", "/classes"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let cache = ResponseCache::default();
        cache.put("u1", "/classes", json!(1));
        cache.put("u2", "/classes", json!(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
