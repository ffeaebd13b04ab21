//! Connection queue error types.

use std::fmt;

/// Errors reported by [`BoundedQueue`](super::BoundedQueue) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has begun shutting down. Expected control flow, not a fault.
    ShuttingDown,

    /// A thread panicked while holding the queue lock.
    ///
    /// The ring state can no longer be trusted; callers must stop using the
    /// queue and terminate.
    Poisoned,

    /// `dispose` was called while other owners still hold the queue.
    InUse {
        /// Number of outstanding references besides the caller's.
        refs: usize,
    },
}

impl QueueError {
    /// Check if this is the shutdown signal.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, QueueError::ShuttingDown)
    }

    /// Check if this error means the process cannot continue safely.
    pub fn is_fatal(&self) -> bool {
        !self.is_shutting_down()
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::ShuttingDown => write!(f, "queue is shutting down"),
            QueueError::Poisoned => write!(f, "queue lock poisoned"),
            QueueError::InUse { refs } => {
                write!(f, "queue still shared by {} other owner(s)", refs)
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// A handle the queue refused to store.
///
/// Ownership returns to the caller, who is responsible for releasing it.
pub struct Rejected<T> {
    handle: T,
    error: QueueError,
}

impl<T> Rejected<T> {
    pub(super) fn new(handle: T, error: QueueError) -> Self {
        Self { handle, error }
    }

    /// Why the handle was rejected.
    pub fn error(&self) -> QueueError {
        self.error
    }

    /// Take back the rejected handle.
    pub fn into_handle(self) -> T {
        self.handle
    }

    /// Split into the handle and the rejection reason.
    pub fn into_parts(self) -> (T, QueueError) {
        (self.handle, self.error)
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle rejected: {}", self.error)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
