use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// TTL set of recently-seen job dedup keys. Ported from
/// `original_source/app/utils/dedup.py::Deduplicator`: a map from key to the
/// monotonic instant of first observation, with an amortized eviction scan
/// on every call rather than a separate sweeper task.
pub struct Deduplicator {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Deduplicator {
    pub fn new(ttl_seconds: u64) -> Self {
        Deduplicator {
            ttl: Duration::from_secs(ttl_seconds.max(1)),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if `key` was already seen within the TTL window; records
    /// it as seen otherwise. A `None`/empty key is never considered seen.
    pub fn seen(&self, key: Option<&str>) -> bool {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return false;
        };
        let now = Instant::now();
        let mut guard = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|_, ts| now.duration_since(*ts) <= self.ttl);
        if guard.contains_key(key) {
            return true;
        }
        guard.insert(key.to_string(), now);
        false
    }
}
