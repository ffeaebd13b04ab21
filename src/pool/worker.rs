//! Worker thread main loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::listener::Connection;
use crate::queue::{BoundedQueue, QueueError};

use super::ConnectionHandler;

/// Counters shared by every worker in a pool.
#[derive(Debug, Default)]
pub(super) struct Counters {
    pub served: AtomicU64,
    pub handler_panics: AtomicU64,
    pub close_errors: AtomicU64,
}

/// Serve connections until the queue reports shutdown.
///
/// Returns an error only when the queue itself is broken.
pub(super) fn run<C, H>(
    id: usize,
    queue: &BoundedQueue<C>,
    handler: &H,
    counters: &Counters,
) -> Result<(), QueueError>
where
    C: Connection,
    H: ConnectionHandler<C>,
{
    tracing::debug!(worker = id, "worker started");

    loop {
        let mut conn = match queue.dequeue() {
            Ok(conn) => conn,
            Err(QueueError::ShuttingDown) => break,
            Err(e) => {
                tracing::error!(worker = id, error = %e, "worker cannot continue");
                return Err(e);
            }
        };

        let peer = conn.peer_addr();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&mut conn))) {
            counters.handler_panics.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                worker = id,
                peer = ?peer,
                panic = %panic_message(payload.as_ref()),
                "handler panicked"
            );
        }

        if let Err(e) = conn.close() {
            counters.close_errors.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(worker = id, peer = ?peer, error = %e, "failed to close connection");
        }
        counters.served.fetch_add(1, Ordering::Relaxed);
    }

    tracing::debug!(worker = id, "worker stopped");
    Ok(())
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
