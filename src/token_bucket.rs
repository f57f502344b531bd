use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

/// Classical token bucket: tokens accrue at `rate_per_second`, capped at
/// `burst`, one consumed per `acquire()`. Used by the API client (§4.6) to
/// shape outbound calls per method. New to this crate — the teacher repo
/// has no outbound rate limiter of its own (its `rate_limit.rs` only guards
/// inbound HTTP) — so this is grounded directly on the spec's algorithm
/// description plus the teacher's `Mutex`-guarded-state idiom.
struct Bucket {
    capacity: f64,
    rate_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: f64, rate_per_second: f64) -> Self {
        Bucket {
            capacity,
            rate_per_second,
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_second).min(self.capacity);
        self.last_refill = now;
    }
}

/// One token bucket per outbound API method, each acquired (and slept on)
/// in isolation from the others — "serialized per bucket", not globally.
/// Each method's `Bucket` lives behind its own `Mutex`, so a sleep on one
/// method's bucket never blocks `acquire()` for any other method; only the
/// brief get-or-insert into the outer map is shared.
pub struct TokenBucketLimiter {
    burst: f64,
    rate_per_second: f64,
    buckets: Mutex<HashMap<String, Arc<Mutex<Bucket>>>>,
}

impl TokenBucketLimiter {
    pub fn new(burst: f64, rate_per_second: f64) -> Self {
        TokenBucketLimiter {
            burst,
            rate_per_second,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Blocks (async-sleeps) until a token for `method` is available, then
    /// consumes it. The per-method bucket lock is held across the sleep,
    /// which is what gives acquisitions for the same method their strict
    /// ordering — but it's a lock scoped to that method alone, so other
    /// methods' acquisitions proceed concurrently.
    pub async fn acquire(&self, method: &str) {
        let bucket = {
            let mut buckets = self.buckets.lock().await;
            buckets
                .entry(method.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Bucket::new(self.burst, self.rate_per_second))))
                .clone()
        };

        let mut bucket = bucket.lock().await;
        bucket.refill();
        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            let wait = std::time::Duration::from_secs_f64(deficit / bucket.rate_per_second);
            tokio::time::sleep(wait).await;
            bucket.refill();
        }
        bucket.tokens -= 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_capacity_is_immediately_available() {
        let limiter = TokenBucketLimiter::new(5.0, 20.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire("sendMessage").await;
        }
        // 5 tokens available up-front: no sleeping required.
        assert!(start.elapsed() < std::time::Duration::from_millis(50));
    }

    #[tokio::test]
    async fn exhausting_the_bucket_forces_a_wait() {
        let limiter = TokenBucketLimiter::new(1.0, 10.0);
        limiter.acquire("deleteMessage").await;
        let start = Instant::now();
        limiter.acquire("deleteMessage").await;
        // Next token refills at 10/s, i.e. ~100ms for one token.
        assert!(start.elapsed() >= std::time::Duration::from_millis(80));
    }

    #[tokio::test]
    async fn buckets_are_independent_per_method() {
        let limiter = TokenBucketLimiter::new(1.0, 10.0);
        limiter.acquire("sendMessage").await;
        let start = Instant::now();
        // A different method's bucket is still full.
        limiter.acquire("banChatMember").await;
        assert!(start.elapsed() < std::time::Duration::from_millis(50));
    }

    #[tokio::test]
    async fn a_sleeping_bucket_does_not_block_another_methods_acquire() {
        let limiter = TokenBucketLimiter::new(1.0, 10.0);
        // Drain sendMessage's one token so the next acquire on it sleeps
        // ~100ms; meanwhile banChatMember's bucket is untouched and full.
        limiter.acquire("sendMessage").await;

        let start = Instant::now();
        let (_, elapsed_for_other) = tokio::join!(limiter.acquire("sendMessage"), async {
            limiter.acquire("banChatMember").await;
            start.elapsed()
        });
        // banChatMember must not be stuck waiting behind sendMessage's sleep.
        assert!(elapsed_for_other < std::time::Duration::from_millis(50));
    }
}
