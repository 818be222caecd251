/*!
 * Shared caching for translation results and enrichment lookups.
 *
 * Both caches the orchestrator owns are instances of [`TtlCache`]: a
 * concurrent map with a sliding lifetime, an absolute lifetime ceiling, and
 * a maximum entry count. Every entry has the same eviction weight, so the
 * capacity bound is a plain count.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::RwLock;

/// Lifetime and capacity policy for a [`TtlCache`].
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Entries unread for this long are expired
    pub sliding_ttl: Duration,

    /// Entries older than this are expired regardless of access
    pub absolute_ttl: Duration,

    /// Maximum number of entries before eviction kicks in
    pub max_entries: usize,
}

impl CachePolicy {
    /// Policy for the primary result cache: 1 hour sliding, 24 hour ceiling.
    pub fn result_cache() -> Self {
        Self {
            sliding_ttl: Duration::from_secs(60 * 60),
            absolute_ttl: Duration::from_secs(24 * 60 * 60),
            max_entries: 10_000,
        }
    }

    /// Policy for the enrichment cache. Pronunciation data changes far less
    /// often than translations, so entries live much longer.
    pub fn enrichment_cache() -> Self {
        Self {
            sliding_ttl: Duration::from_secs(72 * 60 * 60),
            absolute_ttl: Duration::from_secs(72 * 60 * 60),
            max_entries: 5_000,
        }
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    last_access: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, policy: &CachePolicy, now: Instant) -> bool {
        now.duration_since(self.last_access) > policy.sliding_ttl
            || now.duration_since(self.inserted_at) > policy.absolute_ttl
    }
}

/// Concurrent TTL cache with bounded entry count.
///
/// Safe for concurrent read/insert from many tasks; clones share the same
/// underlying storage and counters.
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    policy: CachePolicy,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given policy
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            policy,
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Look up a live entry, refreshing its sliding lifetime on hit
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        let expired = match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(&self.policy, now) => {
                entry.last_access = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache hit for {}", key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or refresh an entry, evicting past the capacity bound.
    ///
    /// Eviction removes expired entries first, then the least recently
    /// accessed live ones.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.write();

        entries.insert(
            key.into(),
            CacheEntry { value, inserted_at: now, last_access: now },
        );

        if entries.len() > self.policy.max_entries {
            entries.retain(|_, entry| !entry.is_expired(&self.policy, now));
        }
        while entries.len() > self.policy.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("evicting cache entry {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Number of entries currently stored (live or not yet pruned)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// (hits, misses, hit rate) since construction or the last clear
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        (hits, misses, hit_rate)
    }
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            policy: self.policy,
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}
