//! Server error types.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::dispatcher::DispatchError;
use crate::pool::PoolError;
use crate::queue::QueueError;

/// Errors that stop the server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration could not be applied.
    Config(ConfigError),
    /// Socket or thread setup failed.
    Io(io::Error),
    /// The connection queue is unusable.
    Queue(QueueError),
    /// The worker pool failed to start or a worker died.
    Pool(PoolError),
    /// The acceptor stopped on its own.
    Dispatch(DispatchError),
    /// The shutdown sequence could not run to completion.
    Runtime(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "configuration error: {}", e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Queue(e) => write!(f, "queue error: {}", e),
            ServerError::Pool(e) => write!(f, "worker pool error: {}", e),
            ServerError::Dispatch(e) => write!(f, "acceptor error: {}", e),
            ServerError::Runtime(msg) => write!(f, "runtime error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Config(e) => Some(e),
            ServerError::Io(e) => Some(e),
            ServerError::Queue(e) => Some(e),
            ServerError::Pool(e) => Some(e),
            ServerError::Dispatch(e) => Some(e),
            ServerError::Runtime(_) => None,
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        ServerError::Config(e)
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        ServerError::Io(e)
    }
}

impl From<QueueError> for ServerError {
    fn from(e: QueueError) -> Self {
        ServerError::Queue(e)
    }
}

impl From<PoolError> for ServerError {
    fn from(e: PoolError) -> Self {
        ServerError::Pool(e)
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        ServerError::Dispatch(e)
    }
}
