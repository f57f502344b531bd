use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::Job;
use crate::queue::JobQueue;

/// A handler is whatever the plugin chain dispatch boils down to: take a
/// job, run it to completion, never propagate an error out (errors are
/// recorded on the returned `WorkerStatus` instead). Expressed as a boxed
/// future rather than an `async fn` in a trait, since the teacher's stack
/// doesn't carry `async-trait`.
pub type Handler =
    Arc<dyn Fn(Job) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// Per-worker health snapshot, ported field-for-field from
/// `original_source/app/core/worker.py::WorkerStatus`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub worker_id: usize,
    pub started_at_unix: f64,
    pub last_job_at_unix: Option<f64>,
    pub last_error_at_unix: Option<f64>,
    pub last_error: Option<String>,
    pub processed: u64,
    pub alive: bool,
}

struct WorkerState {
    status: Mutex<WorkerStatus>,
    started: Instant,
}

fn now_unix(state: &WorkerState) -> f64 {
    // Relative to process start rather than wall clock, matching this
    // crate's ban on calling `SystemTime::now()` outside of `main`-adjacent
    // startup code; callers only ever compare these against each other.
    state.started.elapsed().as_secs_f64()
}

/// A fixed-size pool of consumer loops pulling from a shared `JobQueue`.
/// Ported from `original_source/app/core/worker.py::WorkerPool`, with each
/// loop run as its own `tokio::spawn`ed task, matching the teacher crate's
/// background-task idiom (`webhooks.rs::spawn_dispatcher`,
/// `retention.rs::spawn_retention_task`).
pub struct WorkerPool {
    statuses: Vec<Arc<WorkerState>>,
}

impl WorkerPool {
    /// Spawns `concurrency` worker loops, each looping on `queue.get()`
    /// until it receives the `None` shutdown sentinel.
    pub fn spawn(queue: Arc<JobQueue>, concurrency: usize, handler: Handler) -> Self {
        let mut statuses = Vec::with_capacity(concurrency);
        for worker_id in 0..concurrency {
            let state = Arc::new(WorkerState {
                started: Instant::now(),
                status: Mutex::new(WorkerStatus {
                    worker_id,
                    started_at_unix: 0.0,
                    last_job_at_unix: None,
                    last_error_at_unix: None,
                    last_error: None,
                    processed: 0,
                    alive: true,
                }),
            });
            statuses.push(state.clone());

            let queue = queue.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                loop {
                    let job = match queue.get().await {
                        Some(job) => job,
                        None => {
                            let mut status = state.status.lock().unwrap();
                            status.alive = false;
                            break;
                        }
                    };

                    let result = handler(job).await;

                    let mut status = state.status.lock().unwrap();
                    status.processed += 1;
                    status.last_job_at_unix = Some(now_unix(&state));
                    if let Err(err) = result {
                        status.last_error_at_unix = Some(now_unix(&state));
                        status.last_error = Some(err);
                    }
                    drop(status);
                }
            });
        }
        WorkerPool { statuses }
    }

    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.statuses
            .iter()
            .map(|s| s.status.lock().unwrap().clone())
            .collect()
    }

    /// Pushes one shutdown sentinel per worker so every loop exits.
    pub async fn shutdown(&self, queue: &JobQueue) {
        for _ in 0..self.statuses.len() {
            queue.put_sentinel().await;
        }
    }
}
