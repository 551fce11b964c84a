use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct CacheItem<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheItem<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process key/value store with per-entry TTL.
///
/// Expired entries are evicted lazily by `get` and in bulk by the sweeper task.
/// There is no size bound, so callers should stick to a fixed key space.
///
/// Every `delete`/`clear` bumps a generation counter. A reader that loads a
/// value from the backing store reads `generation()` first and stores with
/// `set_if_current`, so a fill computed before an invalidation never lands.
#[derive(Debug)]
pub struct TtlCache<V> {
    items: RwLock<HashMap<String, CacheItem<V>>>,
    generation: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), item);
    }

    /// Store only if no invalidation happened since `seen` was read.
    /// Returns whether the value was stored.
    pub fn set_if_current(&self, key: impl Into<String>, value: V, ttl: Duration, seen: u64) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != seen {
            return false;
        }
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };
        items.insert(key.into(), item);
        true
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
            match items.get(key) {
                None => return None,
                Some(item) if !item.is_expired(now) => return Some(item.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, unless someone refreshed it meanwhile
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.get(key) {
            Some(item) if item.is_expired(now) => {
                items.remove(key);
                None
            }
            Some(item) => Some(item.value.clone()),
            None => None,
        }
    }

    pub fn delete(&self, key: &str) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        items.remove(key);
    }

    pub fn clear(&self) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|_, item| !item.is_expired(now));
        before - items.len()
    }

    /// Sweep on a fixed period until the cache is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else { break };
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep evicted expired entries");
                }
            }
        })
    }
}

impl<V: Clone + Send + Sync + 'static> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
