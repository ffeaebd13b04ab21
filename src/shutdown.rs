//! Process-wide termination event.
//!
//! Replaces a global "keep running" flag: the signal is created by the owner
//! of the server, cloned into whoever needs to observe it, and fired once.

use tokio_util::sync::{CancellationToken, DropGuard};

/// Cloneable, one-shot termination event.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Later calls have no effect.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether the signal has fired.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal fires.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Guard that fires the signal when dropped.
    ///
    /// Lets a thread that exits on its own (including by panic) pull the rest
    /// of the server into shutdown.
    pub fn trigger_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}
