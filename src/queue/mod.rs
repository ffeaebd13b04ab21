//! Bounded connection queue.
//!
//! A fixed-capacity ring buffer shared by the acceptor (producer) and the
//! worker threads (consumers). Both sides block: producers while the ring is
//! full, consumers while it is empty. Shutdown is a one-way transition that
//! wakes every blocked caller on both sides.
//!
//! ```text
//!            enqueue                     dequeue
//!  acceptor ────────►┌───┬───┬───┬───┐──────────► worker 0..N
//!                    │ 3 │ 4 │   │   │
//!                    └───┴───┴───┴───┘
//!                      ▲       ▲
//!                    read    write
//! ```
//!
//! Handles are never visible to two parties at once: the producer owns a
//! handle until `enqueue` succeeds, the queue owns it while stored, and the
//! consumer owns it after `dequeue`. A rejected `enqueue` hands the handle
//! back through [`Rejected`].

mod error;

pub use error::{QueueError, Rejected};

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Ring storage plus the shutdown flag, guarded by a single lock.
struct Ring<T> {
    slots: Box<[Option<T>]>,
    read: usize,
    write: usize,
    len: usize,
    shutting_down: bool,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            read: 0,
            write: 0,
            len: 0,
            shutting_down: false,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn push(&mut self, handle: T) {
        debug_assert!(!self.is_full());
        debug_assert!(self.slots[self.write].is_none());

        self.slots[self.write] = Some(handle);
        self.write = (self.write + 1) % self.capacity();
        self.len += 1;
        self.debug_check();
    }

    fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let handle = self.slots[self.read].take();
        debug_assert!(handle.is_some(), "occupied slot was empty");
        self.read = (self.read + 1) % self.capacity();
        self.len -= 1;
        self.debug_check();
        handle
    }

    fn drain(&mut self) -> Vec<T> {
        let mut handles = Vec::with_capacity(self.len);
        while let Some(handle) = self.pop() {
            handles.push(handle);
        }
        handles
    }

    #[inline]
    fn debug_check(&self) {
        let cap = self.capacity();
        debug_assert!(self.len <= cap);
        debug_assert_eq!((self.write + cap - self.read) % cap, self.len % cap);
    }
}

/// Fixed-capacity, blocking FIFO queue of connection handles.
///
/// The queue never interprets `T`. It is meant to be shared through an
/// [`Arc`] between one acceptor and a pool of workers, then reclaimed with
/// [`BoundedQueue::dispose`] once every other owner has gone away.
pub struct BoundedQueue<T> {
    state: Mutex<Ring<T>>,
    /// Signalled when a slot frees up.
    not_full: Condvar,
    /// Signalled when a handle is stored.
    not_empty: Condvar,
    capacity: NonZeroUsize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty, active queue with `capacity` slots.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(Ring::with_capacity(capacity.get())),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Store a handle, blocking while the queue is full.
    ///
    /// Returns the handle inside [`Rejected`] if the queue is shutting down,
    /// either at entry or while this call was blocked. The caller then owns
    /// the handle again and must release it.
    pub fn enqueue(&self, handle: T) -> Result<(), Rejected<T>> {
        let mut ring = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(Rejected::new(handle, QueueError::Poisoned)),
        };

        loop {
            if ring.shutting_down {
                return Err(Rejected::new(handle, QueueError::ShuttingDown));
            }
            if !ring.is_full() {
                ring.push(handle);
                drop(ring);
                self.not_empty.notify_one();
                return Ok(());
            }
            ring = match self.not_full.wait(ring) {
                Ok(guard) => guard,
                Err(_) => return Err(Rejected::new(handle, QueueError::Poisoned)),
            };
        }
    }

    /// Take the oldest handle, blocking while the queue is empty.
    ///
    /// Returns [`QueueError::ShuttingDown`] once shutdown has begun, even if
    /// handles are still stored. Those are reclaimed by `dispose`.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut ring = self.lock()?;

        loop {
            if ring.shutting_down {
                return Err(QueueError::ShuttingDown);
            }
            if let Some(handle) = ring.pop() {
                drop(ring);
                self.not_full.notify_one();
                return Ok(handle);
            }
            ring = self
                .not_empty
                .wait(ring)
                .map_err(|_| QueueError::Poisoned)?;
        }
    }

    /// Put the queue into the shutting-down state and wake every waiter.
    ///
    /// Safe to call more than once; later calls change nothing.
    pub fn begin_shutdown(&self) -> Result<(), QueueError> {
        let mut ring = self.lock()?;
        let first = !ring.shutting_down;
        ring.shutting_down = true;
        drop(ring);

        self.not_empty.notify_all();
        self.not_full.notify_all();

        if first {
            tracing::debug!(capacity = self.capacity.get(), "connection queue shutting down");
        }
        Ok(())
    }

    /// Reclaim the queue, returning handles that were never dequeued.
    ///
    /// Fails with [`QueueError::InUse`] while any other `Arc` to the queue is
    /// alive, so a thread can never be blocked inside the queue when it is
    /// torn down.
    pub fn dispose(self: Arc<Self>) -> Result<Vec<T>, QueueError> {
        let queue = Arc::try_unwrap(self).map_err(|shared| QueueError::InUse {
            refs: Arc::strong_count(&shared) - 1,
        })?;
        let mut ring = queue
            .state
            .into_inner()
            .map_err(|_| QueueError::Poisoned)?;
        Ok(ring.drain())
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of stored handles.
    pub fn len(&self) -> usize {
        self.peek().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.peek().is_full()
    }

    /// Whether `begin_shutdown` has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.peek().shutting_down
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ring<T>>, QueueError> {
        self.state.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Read-only access for observers; a poisoned lock still yields a view.
    fn peek(&self) -> MutexGuard<'_, Ring<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.peek();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &ring.len)
            .field("shutting_down", &ring.shutting_down)
            .finish()
    }
}
