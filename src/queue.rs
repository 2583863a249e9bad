//! The admission queue: a bounded-concurrency FIFO in front of the sandbox runner.
//! Generalizes the teacher's `JobQueue`/`worker.rs` pair — which carried a
//! database-backed `JobMessage` to a fixed worker count — into a queue of boxed
//! closures dispatched to a configurable worker pool, with results delivered back
//! through a oneshot channel instead of round-tripping through storage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;

use crate::verdict::SubmissionResult;

/// A unit of work the queue can dispatch: compiles and runs a batch, producing a
/// submission result. Boxed so the queue itself doesn't need to know about
/// [`crate::executor::BatchExecutor`].
pub type Job = Box<dyn FnOnce() -> SubmissionResult + Send + 'static>;

struct Entry {
    job: Job,
    responder: oneshot::Sender<SubmissionResult>,
}

/// Errors returned when a submission cannot be enqueued or its result cannot be
/// retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue already holds `capacity` pending jobs.
    Full,
    /// The worker processing this job was shut down before finishing.
    WorkerDropped,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full => write!(f, "admission queue is full"),
            QueueError::WorkerDropped => write!(f, "worker shut down before completing job"),
        }
    }
}

impl std::error::Error for QueueError {}

/// A snapshot of queue occupancy and lifetime counters, per spec.md §4.3's
/// `status()` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub in_flight: usize,
    pub waiting: usize,
    pub max_concurrent: usize,
    pub total_processed: u64,
    pub total_failed: u64,
}

/// FIFO admission queue with a bounded backlog, serviced by a fixed pool of
/// persistent workers (sized to `max_concurrent`, spec.md §4.3).
pub struct AdmissionQueue {
    entries: Mutex<VecDeque<Entry>>,
    notify: Notify,
    capacity: usize,
    max_concurrent: AtomicUsize,
    pending: AtomicUsize,
    in_flight: AtomicUsize,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(AdmissionQueue {
            entries: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity,
            max_concurrent: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            total_processed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        })
    }

    /// Enqueues a job, returning a receiver for its eventual result. Rejects
    /// immediately (without running anything) when the backlog is already full —
    /// callers map this to a 429 response.
    pub fn submit(&self, job: Job) -> Result<oneshot::Receiver<SubmissionResult>, QueueError> {
        let (tx, rx) = oneshot::channel();

        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            return Err(QueueError::Full);
        }
        entries.push_back(Entry { job, responder: tx });
        self.pending.fetch_add(1, Ordering::SeqCst);
        drop(entries);

        self.notify.notify_one();
        Ok(rx)
    }

    async fn pop(&self) -> Entry {
        loop {
            if let Some(entry) = self.entries.lock().unwrap().pop_front() {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                return entry;
            }
            self.notify.notified().await;
        }
    }

    /// Number of jobs waiting to be picked up by a worker.
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Number of jobs currently executing on a worker.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// A snapshot of the queue's occupancy and lifetime counters, for
    /// `GET /api/health` (spec.md §4.3).
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            in_flight: self.in_flight_count(),
            waiting: self.pending_count(),
            max_concurrent: self.max_concurrent.load(Ordering::SeqCst),
            total_processed: self.total_processed.load(Ordering::SeqCst),
            total_failed: self.total_failed.load(Ordering::SeqCst),
        }
    }
}

/// Spawns `worker_count` persistent workers pulling from `queue`, each running jobs
/// on a blocking thread (sandbox execution is synchronous and CPU/wait heavy, the
/// way the teacher's judger is). Every worker stops once `token` is cancelled.
pub fn spawn_workers(
    queue: Arc<AdmissionQueue>,
    worker_count: usize,
    token: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    queue.max_concurrent.store(worker_count, Ordering::SeqCst);
    (0..worker_count)
        .map(|id| {
            let queue = queue.clone();
            let token = token.clone();
            tokio::spawn(async move { worker_loop(id, queue, token).await })
        })
        .collect()
}

async fn worker_loop(id: usize, queue: Arc<AdmissionQueue>, token: CancellationToken) {
    log::info!("admission queue worker {id} started");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::info!("admission queue worker {id} received shutdown signal, stopping");
                break;
            }
            entry = queue.pop() => {
                queue.in_flight.fetch_add(1, Ordering::SeqCst);
                let Entry { job, responder } = entry;

                let result = match tokio::task::spawn_blocking(job).await {
                    Ok(result) => result,
                    Err(e) => {
                        log::error!("worker {id} job panicked: {e}");
                        queue.in_flight.fetch_sub(1, Ordering::SeqCst);
                        queue.total_failed.fetch_add(1, Ordering::SeqCst);
                        continue;
                    }
                };
                queue.in_flight.fetch_sub(1, Ordering::SeqCst);
                queue.total_processed.fetch_add(1, Ordering::SeqCst);

                if responder.send(result).is_err() {
                    log::warn!("worker {id} finished a job but its receiver was dropped");
                }
            }
        }
    }

    log::info!("admission queue worker {id} has shut down gracefully");
}
