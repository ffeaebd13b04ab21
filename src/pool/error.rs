//! Worker pool error types.

use std::fmt;
use std::io;

use crate::queue::QueueError;

/// Errors that can occur during pool operations.
#[derive(Debug)]
pub enum PoolError {
    /// A worker thread could not be spawned.
    Spawn {
        /// Index of the worker that failed to start.
        worker: usize,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A worker thread panicked outside the handler.
    WorkerPanic(String),

    /// A worker stopped because the queue is no longer usable.
    Fatal(QueueError),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Spawn { worker, source } => {
                write!(f, "failed to spawn worker {}: {}", worker, source)
            }
            PoolError::WorkerPanic(msg) => write!(f, "worker panic: {}", msg),
            PoolError::Fatal(err) => write!(f, "worker stopped: {}", err),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Spawn { source, .. } => Some(source),
            PoolError::Fatal(err) => Some(err),
            PoolError::WorkerPanic(_) => None,
        }
    }
}

impl From<QueueError> for PoolError {
    fn from(err: QueueError) -> Self {
        PoolError::Fatal(err)
    }
}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
