use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window ingress rate limiter guarding the process as a whole
/// (§4.2) — not per-client. Ported in spirit from the teacher crate's
/// `rate_limit.rs::RateLimiter`, simplified to the single process-wide
/// window this spec calls for: `original_source/app/utils/rate_limiter.py`
/// models the same sliding deque directly.
pub struct IngressRateLimiter {
    max_requests: usize,
    window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl IngressRateLimiter {
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        IngressRateLimiter {
            max_requests,
            window: Duration::from_secs(window_seconds.max(1)),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Evicts entries older than the window, then admits iff the remaining
    /// count is still under `max_requests`.
    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(front) = events.front() {
            if now.duration_since(*front) > self.window {
                events.pop_front();
            } else {
                break;
            }
        }
        if events.len() >= self.max_requests {
            return false;
        }
        events.push_back(now);
        true
    }
}
