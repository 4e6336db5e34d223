//! `WorkerPool`: a fixed set of threads draining a shared job queue, used
//! to run per-view extraction and render-record jobs off the main thread.
//!
//! Work-stealing with a private FIFO per worker is the textbook design;
//! built here on `crossbeam-channel` (already a dependency for the job
//! system) as one shared MPMC channel every worker drains — the "steal"
//! is implicit in the channel being multi-consumer, which is a simpler
//! realization of the same "any idle worker takes the next job" contract
//! without a second per-worker deque to keep in sync.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Identifies a job scheduled onto a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

type BoxedJob = Box<dyn FnOnce() -> Box<dyn std::any::Any + Send> + Send>;

struct Scheduled {
    work: BoxedJob,
    done_tx: Sender<Box<dyn std::any::Any + Send>>,
}

/// A pool of worker threads draining one shared job queue.
///
/// Jobs are untyped at the queue level (`Box<dyn Any + Send>` results);
/// [`WorkerPool::wait`] downcasts back to the caller's expected type,
/// Result retrieval goes through the job object returned by `schedule`.
pub struct WorkerPool {
    job_tx: Sender<Scheduled>,
    next_id: AtomicU64,
    // Held only to join on drop; workers run until the channel's sender
    // side (this field's sibling `job_tx`) is dropped.
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` threads, each looping on the shared job
    /// channel until the pool is dropped.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let (job_tx, job_rx): (Sender<Scheduled>, Receiver<Scheduled>) = unbounded();
        let workers = (0..worker_count.max(1))
            .map(|index| {
                let job_rx = job_rx.clone();
                std::thread::Builder::new()
                    .name(format!("render-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = job_rx.recv() {
                            let result = (job.work)();
                            // The caller may have already given up waiting
                            // (e.g. shutdown); a closed receiver here is not
                            // an error for the worker.
                            let _ = job.done_tx.send(result);
                        }
                    })
                    .expect("failed to spawn render worker thread")
            })
            .collect();
        Self {
            job_tx,
            next_id: AtomicU64::new(1),
            _workers: workers,
        }
    }

    /// Schedules `work` and returns a [`JobId`] that [`WorkerPool::wait`]
    /// resolves back to its result.
    pub fn schedule<T, F>(&self, work: F) -> Job<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let boxed: BoxedJob = Box::new(move || Box::new(work()) as Box<dyn std::any::Any + Send>);
        self.job_tx
            .send(Scheduled { work: boxed, done_tx })
            .expect("worker pool job channel closed");
        Job {
            id,
            done_rx,
            _marker: std::marker::PhantomData,
        }
    }

    /// Blocks until `job` completes and returns its result.
    ///
    /// # Panics
    ///
    /// Panics if the job's worker thread panicked, or if the result's
    /// dynamic type doesn't match `T` (a programmer error: every
    /// [`WorkerPool::schedule`] call pairs its own `T` with its own `Job`).
    #[must_use]
    pub fn wait<T: Send + 'static>(&self, job: Job<T>) -> T {
        let boxed = job.done_rx.recv().expect("worker dropped its job result");
        *boxed
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("job {:?} produced an unexpected result type", job.id))
    }
}

/// A handle to a job scheduled on a [`WorkerPool`], typed by its eventual
/// result so [`WorkerPool::wait`] can downcast without the caller
/// re-specifying the type.
pub struct Job<T> {
    id: JobId,
    done_rx: Receiver<Box<dyn std::any::Any + Send>>,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Job<T> {
    /// This job's id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_then_wait_round_trips_a_result() {
        let pool = WorkerPool::new(2);
        let job = pool.schedule(|| 2 + 2);
        assert_eq!(pool.wait(job), 4);
    }

    #[test]
    fn many_jobs_across_few_workers_all_complete() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<_> = (0..50).map(|i| pool.schedule(move || i * i)).collect();
        let results: Vec<_> = jobs.into_iter().map(|j| pool.wait(j)).collect();
        for (i, r) in results.into_iter().enumerate() {
            assert_eq!(r, (i * i) as i32);
        }
    }

    #[test]
    fn distinct_jobs_get_distinct_ids() {
        let pool = WorkerPool::new(1);
        let a = pool.schedule(|| 1);
        let b = pool.schedule(|| 2);
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.wait(a), 1);
        assert_eq!(pool.wait(b), 2);
    }
}
