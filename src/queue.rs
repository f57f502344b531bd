use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::config::QueueFullPolicy;
use crate::dedup::Deduplicator;
use crate::models::{Job, Priority, QueueDecision};
use crate::stats::Stats;

/// Two-priority bounded job queue with a shared `max_size` across both
/// sub-queues. Ported from `original_source/app/core/queue.py::JobQueue`.
/// `asyncio.Queue`'s blocking `get()`/internal condition variable is
/// replaced here with an explicit `tokio::sync::Notify`, since
/// `VecDeque`-backed queues have no built-in waiter.
pub struct JobQueue {
    max_size: usize,
    policy: QueueFullPolicy,
    dedup: Deduplicator,
    inner: Mutex<Inner>,
    notify: Notify,
    stats: Arc<Stats>,
}

struct Inner {
    high: VecDeque<Option<Job>>,
    normal: VecDeque<Option<Job>>,
}

impl Inner {
    fn size(&self) -> usize {
        self.high.len() + self.normal.len()
    }
}

impl JobQueue {
    pub fn new(
        max_size: usize,
        policy: QueueFullPolicy,
        dedup_ttl_seconds: u64,
        stats: Arc<Stats>,
    ) -> Self {
        JobQueue {
            max_size: max_size.max(1),
            policy,
            dedup: Deduplicator::new(dedup_ttl_seconds),
            inner: Mutex::new(Inner {
                high: VecDeque::new(),
                normal: VecDeque::new(),
            }),
            notify: Notify::new(),
            stats,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_with_default_stats(
        max_size: usize,
        policy: QueueFullPolicy,
        dedup_ttl_seconds: u64,
    ) -> Self {
        Self::new(max_size, policy, dedup_ttl_seconds, Arc::new(Stats::new()))
    }

    /// Classifies and enqueues `job`, returning the decision that governs
    /// the router's HTTP response (§4.2, §8 scenario 1/2/3).
    ///
    /// Dedup is checked before any mutation: a duplicate key leaves both
    /// sub-queues untouched. Otherwise, if the queue is at `max_size`, the
    /// configured policy applies — `reject` drops the new job, `drop_oldest`
    /// evicts from `normal` first and only falls back to `high` if `normal`
    /// is empty, matching `original_source/app/core/queue.py::enqueue`.
    pub async fn enqueue(&self, job: Job) -> QueueDecision {
        if self.dedup.seen(job.dedup_key.as_deref()) {
            self.stats.record_dedup();
            return QueueDecision::Duplicate;
        }

        let mut inner = self.inner.lock().await;
        if inner.size() >= self.max_size {
            match self.policy {
                QueueFullPolicy::Reject => {
                    self.stats.record_drop();
                    return QueueDecision::Dropped;
                }
                QueueFullPolicy::DropOldest => {
                    if inner.normal.pop_front().is_none() {
                        inner.high.pop_front();
                    }
                    self.stats.record_drop();
                }
            }
        }

        match job.priority {
            Priority::High => inner.high.push_back(Some(job)),
            Priority::Normal => inner.normal.push_back(Some(job)),
        }
        let size = inner.size();
        drop(inner);
        self.notify.notify_one();
        self.stats.record_enqueue(size);
        QueueDecision::Enqueued
    }

    /// Waits for and returns the next job, preferring `high` over `normal`,
    /// matching `original_source/app/core/queue.py::get`. `None` is the
    /// sentinel a worker receives to shut down (see `put_sentinel`).
    pub async fn get(&self) -> Option<Job> {
        loop {
            {
                let mut inner = self.inner.lock().await;
                if let Some(job) = inner.high.pop_front() {
                    return job;
                }
                if let Some(job) = inner.normal.pop_front() {
                    return job;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Pushes a `None` sentinel onto `high`, so it's picked up ahead of any
    /// pending work and a worker can shut down promptly.
    pub async fn put_sentinel(&self) {
        let mut inner = self.inner.lock().await;
        inner.high.push_back(None);
        drop(inner);
        self.notify.notify_one();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.size()
    }

    /// `(high_size, normal_size)`, for the `/health/queue` snapshot (§6).
    pub async fn sizes(&self) -> (usize, usize) {
        let inner = self.inner.lock().await;
        (inner.high.len(), inner.normal.len())
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Empties both sub-queues without dispatching any of the dropped jobs,
    /// for the `/health/queue/drain` administrative operation (§4.2).
    pub async fn drain(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let dropped = inner.size();
        inner.high.clear();
        inner.normal.clear();
        dropped
    }
}

pub type SharedJobQueue = Arc<JobQueue>;
