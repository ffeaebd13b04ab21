//! Fixed-size pool of connection workers.
//!
//! Every worker runs the same loop against one shared [`BoundedQueue`]:
//! take a connection, hand it to the [`ConnectionHandler`], close it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      WorkerPool                            │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐    ┌─────────┐    ┌─────────┐                 │
//! │  │ Worker0 │    │ Worker1 │    │ Worker2 │  ...            │
//! │  └────┬────┘    └────┬────┘    └────┬────┘                 │
//! │       │              │              │                      │
//! │       └──────────────┴──────────────┘                      │
//! │                      │ dequeue()                           │
//! │              ┌───────▼───────┐                             │
//! │              │ BoundedQueue  │                             │
//! │              └───────▲───────┘                             │
//! │                      │ enqueue()                           │
//! │              ┌───────┴───────┐                             │
//! │              │  Dispatcher   │                             │
//! │              └───────────────┘                             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `Running` → `Draining` (queue shut down, in-flight handlers finishing) →
//! `Stopped` (all workers joined). The pool never shuts the queue down on
//! its own during normal operation; the owner does that, then calls
//! [`WorkerPool::join`].

mod error;
mod worker;

pub use error::{PoolError, PoolResult};

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::listener::Connection;
use crate::queue::{BoundedQueue, QueueError};

use worker::Counters;

/// Processes one connection on a worker thread.
///
/// Implementations must contain their own errors: whatever happens inside
/// `handle`, the worker closes the connection afterwards and keeps looping.
pub trait ConnectionHandler<C>: Send + Sync + 'static {
    fn handle(&self, conn: &mut C);
}

impl<C, F> ConnectionHandler<C> for F
where
    F: Fn(&mut C) + Send + Sync + 'static,
{
    fn handle(&self, conn: &mut C) {
        self(conn)
    }
}

/// Observable pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Workers are looping on the queue.
    Running,
    /// The queue is shutting down; workers are finishing and exiting.
    Draining,
    /// Every worker has been joined.
    Stopped,
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections taken from the queue and closed.
    pub served: u64,
    /// Handler invocations that panicked.
    pub handler_panics: u64,
    /// Connections whose close reported an error.
    pub close_errors: u64,
}

type WorkerHandle = JoinHandle<Result<(), QueueError>>;

/// A fixed set of worker threads bound to one queue.
pub struct WorkerPool<C: Connection> {
    workers: Mutex<Vec<WorkerHandle>>,
    queue: Arc<BoundedQueue<C>>,
    counters: Arc<Counters>,
    stopped: AtomicBool,
    worker_count: usize,
    name: String,
}

impl<C: Connection> WorkerPool<C> {
    /// Spawn `workers` threads named `{name}-{id}` serving `queue` with `handler`.
    ///
    /// If any thread fails to spawn, the queue is shut down, the workers
    /// already running are joined, and the spawn error is returned.
    pub fn start<H>(
        workers: NonZeroUsize,
        name: impl Into<String>,
        queue: Arc<BoundedQueue<C>>,
        handler: H,
    ) -> PoolResult<Self>
    where
        H: ConnectionHandler<C>,
    {
        let name = name.into();
        let handler = Arc::new(handler);
        let counters = Arc::new(Counters::default());
        let mut handles = Vec::with_capacity(workers.get());

        for id in 0..workers.get() {
            let worker_queue = Arc::clone(&queue);
            let worker_handler = Arc::clone(&handler);
            let worker_counters = Arc::clone(&counters);

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, id))
                .spawn(move || {
                    worker::run(id, &worker_queue, worker_handler.as_ref(), &worker_counters)
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    tracing::error!(pool = %name, worker = id, error = %source, "failed to spawn worker");
                    if let Err(e) = queue.begin_shutdown() {
                        tracing::error!(pool = %name, error = %e, "failed to stop started workers");
                    }
                    // Failures are logged inside; the spawn error is the one reported.
                    reap(&name, handles);
                    return Err(PoolError::Spawn { worker: id, source });
                }
            }
        }

        tracing::info!(
            pool = %name,
            workers = workers.get(),
            capacity = queue.capacity(),
            "worker pool started"
        );

        Ok(Self {
            workers: Mutex::new(handles),
            queue,
            counters,
            stopped: AtomicBool::new(false),
            worker_count: workers.get(),
            name,
        })
    }

    /// Wait for every worker to exit. No timeout.
    ///
    /// Call after the queue has been shut down; otherwise this blocks for as
    /// long as workers keep finding connections. Returns the first failure
    /// reported by any worker.
    pub fn join(&self) -> PoolResult<()> {
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };

        let first_error = reap(&self.name, handles);
        self.stopped.store(true, Ordering::Release);

        let stats = self.stats();
        tracing::info!(
            pool = %self.name,
            served = stats.served,
            handler_panics = stats.handler_panics,
            "worker pool stopped"
        );

        first_error.map_or(Ok(()), Err)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        if self.stopped.load(Ordering::Acquire) {
            PoolState::Stopped
        } else if self.queue.is_shutting_down() {
            PoolState::Draining
        } else {
            PoolState::Running
        }
    }

    /// Snapshot of the shared counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            served: self.counters.served.load(Ordering::Relaxed),
            handler_panics: self.counters.handler_panics.load(Ordering::Relaxed),
            close_errors: self.counters.close_errors.load(Ordering::Relaxed),
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Pool name used for thread names and logs.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Join every handle, logging abnormal exits. Returns the first failure.
fn reap(pool: &str, handles: Vec<WorkerHandle>) -> Option<PoolError> {
    let mut first_error = None;
    for handle in handles {
        let failure = match handle.join() {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => PoolError::Fatal(e),
            Err(payload) => PoolError::WorkerPanic(worker::panic_message(payload.as_ref())),
        };
        tracing::error!(pool = %pool, error = %failure, "worker exited abnormally");
        first_error.get_or_insert(failure);
    }
    first_error
}

impl<C: Connection> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        tracing::warn!(pool = %self.name, "worker pool dropped while running, stopping workers");
        let _ = self.queue.begin_shutdown();
        let _ = self.join();
    }
}
