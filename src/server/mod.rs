//! Static file server built from the acceptor, queue and worker pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use queue_httpd::config::Config;
//! use queue_httpd::server::Server;
//!
//! let config = Config::from_env()?;
//! let server = Server::bind(&config.server, &config.pool)?;
//! let summary = server.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```
//!
//! # Shutdown
//!
//! [`Server::run`] returns once the termination future completes or the
//! [`ShutdownSignal`] fires (for example because the acceptor died). The
//! teardown then runs in a fixed order:
//!
//! 1. trigger the signal so the acceptor stops calling `accept`
//! 2. shut the queue down, waking the acceptor and idle workers
//! 3. join the acceptor, then the workers (in-flight requests complete)
//! 4. dispose of the queue and close every connection still inside it

mod error;
mod handler;
mod request;
mod response;

pub use error::ServerError;
pub use handler::{FileHandler, Served};
pub use request::{parse_request_line, read_request, relative_path, RequestError, RequestLine, MAX_HEAD_BYTES};
pub use response::{write_file, write_status, Status, SERVER_NAME};

use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{PoolConfig, ServerConfig};
use crate::dispatcher::{DispatchError, DispatchStats, Dispatcher};
use crate::listener::{self, Connection, TcpConnection};
use crate::pool::{PoolStats, WorkerPool};
use crate::queue::BoundedQueue;
use crate::shutdown::ShutdownSignal;

/// Worker thread name prefix.
const WORKER_NAME: &str = "worker";

/// Counters collected over the server's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerSummary {
    pub dispatch: DispatchStats,
    pub pool: PoolStats,
    /// Connections still queued at shutdown, closed without a response.
    pub undelivered: usize,
}

/// A bound, not yet running server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: FileHandler,
    worker_count: NonZeroUsize,
    queue_capacity: NonZeroUsize,
    io_timeout: Option<Duration>,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Validate the served directory and bind the listening socket.
    pub fn bind(server: &ServerConfig, pool: &PoolConfig) -> Result<Self, ServerError> {
        let root = server.canonical_serve_dir()?;
        let socket = server.listener_config();
        let listener = listener::bind(&socket)?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, root = %root.display(), "listener bound");

        Ok(Self {
            listener,
            local_addr,
            handler: FileHandler::new(root, server.index_file.clone()),
            worker_count: pool.worker_count(),
            queue_capacity: pool.queue_capacity(),
            io_timeout: socket.io_timeout,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Address the listener is bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops the server when triggered.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Serve until `termination` completes or the shutdown signal fires.
    pub async fn run<F>(self, termination: F) -> Result<ServerSummary, ServerError>
    where
        F: Future<Output = ()>,
    {
        let queue = Arc::new(BoundedQueue::new(self.queue_capacity));
        let pool = WorkerPool::start(
            self.worker_count,
            WORKER_NAME,
            Arc::clone(&queue),
            self.handler,
        )?;

        let acceptor = Dispatcher::new(self.listener, Arc::clone(&queue), self.shutdown.clone())
            .with_io_timeout(self.io_timeout)
            .spawn();
        let acceptor = match acceptor {
            Ok(handle) => handle,
            Err(e) => {
                queue.begin_shutdown()?;
                pool.join()?;
                return Err(ServerError::Io(e));
            }
        };

        info!(
            addr = %self.local_addr,
            workers = pool.worker_count(),
            queue_capacity = queue.capacity(),
            "server started"
        );

        tokio::select! {
            _ = termination => info!("termination requested"),
            _ = self.shutdown.triggered() => info!("shutdown signalled"),
        }

        let signal = self.shutdown.clone();
        tokio::task::spawn_blocking(move || teardown(signal, queue, acceptor, pool))
            .await
            .map_err(|e| ServerError::Runtime(format!("teardown task failed: {}", e)))?
    }
}

fn teardown(
    signal: ShutdownSignal,
    queue: Arc<BoundedQueue<TcpConnection>>,
    acceptor: JoinHandle<Result<DispatchStats, DispatchError>>,
    pool: WorkerPool<TcpConnection>,
) -> Result<ServerSummary, ServerError> {
    signal.trigger();
    queue.begin_shutdown()?;

    let dispatched = acceptor
        .join()
        .map_err(|_| ServerError::Runtime("acceptor thread panicked".into()))?;
    debug!("acceptor joined");

    let joined = pool.join();
    let pool_stats = pool.stats();
    drop(pool);

    let leftovers = queue.dispose()?;
    let undelivered = leftovers.len();
    for conn in leftovers {
        if let Err(e) = conn.close() {
            debug!(error = %e, "failed to close undelivered connection");
        }
    }
    if undelivered > 0 {
        warn!(undelivered, "closed queued connections without a response");
    }

    let dispatch = dispatched?;
    joined?;

    let summary = ServerSummary {
        dispatch,
        pool: pool_stats,
        undelivered,
    };
    info!(
        accepted = summary.dispatch.accepted,
        served = summary.pool.served,
        rejected = summary.dispatch.rejected,
        undelivered,
        "server stopped"
    );
    Ok(summary)
}
