//! TTL cache of model memory estimates.

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct CacheEntry {
    memory_gb: f64,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Concurrent model name to memory (GB) map with per-entry expiry.
///
/// Writes replace the whole entry; the last writer wins. Expired entries are
/// dropped lazily on read.
#[derive(Debug)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached estimate, if present and unexpired.
    pub fn get(&self, model_name: &str) -> Option<f64> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(model_name)
            .map(|entry| (entry.memory_gb, entry.is_fresh(now)))?;

        match hit {
            (memory_gb, true) => Some(memory_gb),
            (_, false) => {
                self.entries
                    .remove_if(model_name, |_, entry| !entry.is_fresh(now));
                None
            }
        }
    }

    /// Store an estimate for the configured TTL.
    ///
    /// A TTL too large to add to the current instant never expires.
    pub fn insert(&self, model_name: &str, memory_gb: f64) {
        let entry = CacheEntry {
            memory_gb,
            expires_at: Instant::now().checked_add(self.ttl),
        };
        self.entries.insert(model_name.to_string(), entry);
    }

    /// Number of stored entries, expired ones included until next read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
