//! Time-bounded response cache keyed by request path and query
//!
//! Successful bodies and 404 outcomes are cached; errors never are. Entries
//! older than the TTL are treated as absent. Every insert sweeps expired
//! entries, so the map never outlives one TTL of traffic.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a GET that is worth remembering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// 2xx body text
    Body(String),
    /// 404
    NotFound,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    value: Fetched,
}

/// Response cache shared by all requests of one client
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// A zero TTL disables caching
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh entry for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Fetched> {
        if !self.is_enabled() {
            return None;
        }

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    debug!(key = %key, "Response cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: evict
        self.entries.write().await.remove(key);
        debug!(key = %key, "Response cache entry expired");
        None
    }

    pub async fn insert(&self, key: String, value: Fetched) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept, "Swept expired response cache entries");
        }

        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
