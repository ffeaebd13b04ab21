//! Acceptor loop.
//!
//! Runs on its own thread with a single-threaded tokio runtime so `accept`
//! can be raced against the [`ShutdownSignal`]. Accepted sockets are switched
//! to blocking mode and pushed into the [`BoundedQueue`]; `enqueue` blocks the
//! acceptor while the queue is full, which is the server's backpressure.

use std::fmt;
use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::listener::{Connection, TcpConnection};
use crate::queue::{BoundedQueue, QueueError};
use crate::shutdown::ShutdownSignal;

/// Counters reported when the acceptor exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Connections returned by `accept`.
    pub accepted: u64,
    /// Connections stored in the queue.
    pub enqueued: u64,
    /// Connections refused by the queue and closed by the acceptor.
    pub rejected: u64,
}

/// Reasons the acceptor stopped before a requested shutdown.
#[derive(Debug)]
pub enum DispatchError {
    /// Non-transient `accept` failure.
    Accept(io::Error),
    /// The acceptor runtime or listener registration failed.
    Runtime(io::Error),
    /// The queue is broken.
    Queue(QueueError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Accept(e) => write!(f, "accept failed: {}", e),
            DispatchError::Runtime(e) => write!(f, "acceptor runtime error: {}", e),
            DispatchError::Queue(e) => write!(f, "enqueue failed: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Accept(e) | DispatchError::Runtime(e) => Some(e),
            DispatchError::Queue(e) => Some(e),
        }
    }
}

/// Accepts connections and feeds them to the worker queue.
pub struct Dispatcher {
    listener: TcpListener,
    queue: Arc<BoundedQueue<TcpConnection>>,
    shutdown: ShutdownSignal,
    io_timeout: Option<Duration>,
}

impl Dispatcher {
    /// `listener` must already be in non-blocking mode (see [`crate::listener::bind`]).
    pub fn new(
        listener: TcpListener,
        queue: Arc<BoundedQueue<TcpConnection>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            listener,
            queue,
            shutdown,
            io_timeout: None,
        }
    }

    /// Read/write timeout applied to accepted connections.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Run the acceptor on a dedicated thread named `acceptor`.
    ///
    /// The shutdown signal fires when the thread exits, whatever the reason,
    /// so an acceptor failure brings the rest of the server down with it.
    pub fn spawn(self) -> io::Result<JoinHandle<Result<DispatchStats, DispatchError>>> {
        thread::Builder::new()
            .name("acceptor".to_string())
            .spawn(move || {
                let _guard = self.shutdown.trigger_on_drop();
                self.run()
            })
    }

    /// Run the acceptor on the current thread until shutdown.
    pub fn run(self) -> Result<DispatchStats, DispatchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .map_err(DispatchError::Runtime)?;
        runtime.block_on(self.accept_loop())
    }

    async fn accept_loop(self) -> Result<DispatchStats, DispatchError> {
        let listener =
            tokio::net::TcpListener::from_std(self.listener).map_err(DispatchError::Runtime)?;
        let mut stats = DispatchStats::default();

        info!(addr = ?listener.local_addr().ok(), "acceptor started");

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) if is_transient(&e) => {
                        warn!(error = %e, "transient accept error");
                        continue;
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                        return Err(DispatchError::Accept(e));
                    }
                },
            };
            stats.accepted += 1;

            let conn = match stream
                .into_std()
                .and_then(|s| TcpConnection::new(s, peer, self.io_timeout))
            {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "failed to prepare connection");
                    continue;
                }
            };

            if let Err(rejected) = self.queue.enqueue(conn) {
                let (conn, err) = rejected.into_parts();
                stats.rejected += 1;
                if let Err(e) = conn.close() {
                    debug!(peer = %peer, error = %e, "failed to close rejected connection");
                }
                if err.is_shutting_down() {
                    debug!(peer = %peer, "queue shutting down, connection closed unserved");
                    break;
                }
                return Err(DispatchError::Queue(err));
            }
            stats.enqueued += 1;
        }

        info!(
            accepted = stats.accepted,
            enqueued = stats.enqueued,
            rejected = stats.rejected,
            "acceptor stopped"
        );
        Ok(stats)
    }
}

/// Accept errors that concern a single pending connection, not the listener.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
