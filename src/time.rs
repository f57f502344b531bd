use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds since the Unix epoch. The only place this crate reads
/// `SystemTime` directly — everywhere else (dedup TTLs, the ingress rate
/// limiter, token buckets, anti-flood windows) uses a monotonic `Instant`
/// per §9 Design Notes ("use a monotonic clock for rate limiting,
/// deduplication TTL, token buckets, and anti-flood windows; use wall time
/// only for persisted timestamps"). Callers: the router stamps `Job::received_at`
/// with this, and the janitor passes it as `now` to `Store::cleanup_incoming_updates`.
pub fn wall_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
