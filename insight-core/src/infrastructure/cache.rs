// insight-core/src/infrastructure/cache.rs
//
// Process-wide result cache: bounded LRU + fixed TTL per entry.
// Shared across concurrent requests, no per-user partitioning.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::ports::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        // A TTL past the end of `Instant` never expires
        self.inserted_at
            .checked_add(self.ttl)
            .is_none_or(|expires_at| now < expires_at)
    }
}

/// Held while a key is being recomputed; other callers for the same key wait.
pub type KeyGuard = OwnedMutexGuard<()>;

pub struct ResultCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(capacity: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(size)),
            inflight: Mutex::new(HashMap::new()),
            default_ttl,
            clock,
        }
    }

    /// Fresh value or `None`. Expired entries are dropped on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut guard = lock(&self.entries);

        let lookup = guard
            .get(key)
            .map(|entry| entry.is_fresh(now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                debug!(key, "cache entry expired");
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            ttl,
        };
        let mut guard = lock(&self.entries);
        if let Some((evicted, _)) = guard.push(key.into(), entry)
            && !guard.contains(&evicted)
        {
            debug!(key = %evicted, "cache full, evicted least recently used entry");
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        lock(&self.entries).cap().get()
    }

    /// Per-key async lock: at most one recomputation per key at a time.
    pub async fn lock_key(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut map = lock(&self.inflight);
            // Slots only referenced by the map are idle
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(key.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }
}

/// A poisoned lock still holds a consistent map: every write is a single call.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}
