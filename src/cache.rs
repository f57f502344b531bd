use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Bounded, recency-ordered read-through cache with a per-entry TTL.
/// Ported from `original_source/app/utils/cache.py::LruTtlCache`. The
/// teacher crate doesn't carry an `indexmap`/`lru` dependency, so recency is
/// tracked with a plain `Vec<K>` acting as an MRU-ordered list — adequate at
/// the cache sizes this spec calls for (default 1024 entries).
pub struct LruTtlCache<V> {
    max_size: usize,
    ttl: Duration,
    entries: HashMap<String, (Instant, V)>,
    order: Vec<String>,
}

impl<V: Clone> LruTtlCache<V> {
    pub fn new(max_size: usize, ttl_seconds: u64) -> Self {
        LruTtlCache {
            max_size: max_size.max(1),
            ttl: Duration::from_secs(ttl_seconds.max(1)),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    /// Returns the cached value if present and unexpired, promoting it to
    /// MRU; otherwise evicts the stale entry (if any) and returns `None`.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some((ts, _)) => ts.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            return None;
        }
        self.touch(key);
        self.entries.get(key).map(|(_, v)| v.clone())
    }

    /// Inserts `value` as MRU, evicting the LRU entry while over capacity.
    pub fn set(&mut self, key: &str, value: V) {
        if self.entries.contains_key(key) {
            self.order.retain(|k| k != key);
        }
        self.entries.insert(key.to_string(), (Instant::now(), value));
        self.order.push(key.to_string());
        while self.order.len() > self.max_size {
            let evict = self.order.remove(0);
            self.entries.remove(&evict);
        }
    }

    /// Removes `key` unconditionally, regardless of TTL.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}
