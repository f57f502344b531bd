use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

/// Process-global counters and timings. Ported from
/// `original_source/app/utils/stats.py::StatsCollector`. Fails with no
/// error by design — every `record_*` method only ever mutates in-memory
/// state under a mutex.
pub struct Stats {
    started_at: Instant,
    inner: Mutex<StatsInner>,
}

#[derive(Default)]
struct StatsInner {
    total_updates: u64,
    total_errors: u64,
    total_enqueued: u64,
    total_dropped: u64,
    total_deduped: u64,
    total_dispatch_ms: f64,
    last_dispatch_ms: f64,
    last_queue_size: usize,
    last_error_at: Option<Instant>,
}

#[derive(Debug, Serialize, Clone)]
pub struct StatsSnapshot {
    pub total_updates: u64,
    pub total_errors: u64,
    pub total_enqueued: u64,
    pub total_dropped: u64,
    pub total_deduped: u64,
    pub avg_dispatch_ms: f64,
    pub last_dispatch_ms: f64,
    pub last_queue_size: usize,
    pub uptime_seconds: u64,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            started_at: Instant::now(),
            inner: Mutex::new(StatsInner::default()),
        }
    }

    pub fn record_enqueue(&self, queue_size: usize) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.total_enqueued += 1;
        s.last_queue_size = queue_size;
    }

    pub fn record_drop(&self) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.total_dropped += 1;
    }

    pub fn record_dedup(&self) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.total_deduped += 1;
    }

    pub fn record_dispatch(&self, duration_ms: f64, error: bool) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.total_updates += 1;
        s.total_dispatch_ms += duration_ms;
        s.last_dispatch_ms = duration_ms;
        if error {
            s.total_errors += 1;
            s.last_error_at = Some(Instant::now());
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let avg = if s.total_updates == 0 {
            0.0
        } else {
            s.total_dispatch_ms / s.total_updates as f64
        };
        StatsSnapshot {
            total_updates: s.total_updates,
            total_errors: s.total_errors,
            total_enqueued: s.total_enqueued,
            total_dropped: s.total_dropped,
            total_deduped: s.total_deduped,
            avg_dispatch_ms: avg,
            last_dispatch_ms: s.last_dispatch_ms,
            last_queue_size: s.last_queue_size,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
