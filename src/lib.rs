//! queue_httpd - a static file server built on a bounded connection queue.
//!
//! One acceptor thread pushes accepted connections into a fixed-capacity
//! FIFO; a fixed pool of worker threads pops them and serves one HTTP/1.0
//! request each from a directory on disk.
//!
//! # Architecture
//!
//! - [`queue::BoundedQueue`] - blocking ring buffer with cooperative shutdown
//! - [`pool::WorkerPool`] - worker threads draining the queue
//! - [`dispatcher::Dispatcher`] - accept loop feeding the queue
//! - [`server::Server`] - wiring, static file handler, shutdown ordering
//!
//! # Example
//!
//! ```rust,ignore
//! use queue_httpd::config::Config;
//! use queue_httpd::server::Server;
//!
//! let config = Config::from_env()?;
//! let server = Server::bind(&config.server, &config.pool)?;
//! server.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod dispatcher;
pub mod listener;
pub mod logging;
pub mod pool;
pub mod queue;
pub mod server;
pub mod shutdown;

// Re-exports for convenience
pub use config::Config;
pub use queue::{BoundedQueue, QueueError, Rejected};
pub use server::{Server, ServerError, ServerSummary};
pub use shutdown::ShutdownSignal;
