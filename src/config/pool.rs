//! Worker pool configuration.

use std::num::NonZeroUsize;

use super::parse::{env_or, parse_value};
use super::ConfigError;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 5;

/// Queue slots per worker when `QUEUE_CAPACITY` is left at 0.
const QUEUE_SLOTS_PER_WORKER: usize = 2;

/// Worker pool configuration loaded from environment.
///
/// All values are resolved at construction time and never zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    worker_count: NonZeroUsize,
    queue_capacity: NonZeroUsize,
}

impl PoolConfig {
    pub fn new(worker_count: NonZeroUsize, queue_capacity: NonZeroUsize) -> Self {
        Self {
            worker_count,
            queue_capacity,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker_count = resolve_worker_count(&env_or("WORKERS", &DEFAULT_WORKERS.to_string()))?;
        let queue_capacity = resolve_queue_capacity(&env_or("QUEUE_CAPACITY", "0"), worker_count)?;

        Ok(Self {
            worker_count,
            queue_capacity,
        })
    }

    #[inline]
    pub fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }

    #[inline]
    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
    }
}

/// `0` resolves to the number of CPUs.
fn resolve_worker_count(raw: &str) -> Result<NonZeroUsize, ConfigError> {
    let workers: usize = parse_value("WORKERS", raw)?;
    let count = if workers == 0 { num_cpus::get() } else { workers };

    NonZeroUsize::new(count).ok_or_else(|| ConfigError::Invalid {
        key: "WORKERS".into(),
        message: "worker count cannot be zero".into(),
    })
}

/// `0` resolves to a small multiple of the worker count.
fn resolve_queue_capacity(raw: &str, workers: NonZeroUsize) -> Result<NonZeroUsize, ConfigError> {
    let capacity: usize = parse_value("QUEUE_CAPACITY", raw)?;
    let count = if capacity == 0 {
        workers.get() * QUEUE_SLOTS_PER_WORKER
    } else {
        capacity
    };

    NonZeroUsize::new(count).ok_or_else(|| ConfigError::Invalid {
        key: "QUEUE_CAPACITY".into(),
        message: "queue capacity cannot be zero".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_worker_count_explicit() {
        assert_eq!(resolve_worker_count("4").unwrap(), nz(4));
    }

    #[test]
    fn test_worker_count_auto() {
        assert_eq!(resolve_worker_count("0").unwrap().get(), num_cpus::get());
    }

    #[test]
    fn test_worker_count_invalid() {
        assert!(matches!(
            resolve_worker_count("many"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_queue_capacity_explicit() {
        assert_eq!(resolve_queue_capacity("50", nz(4)).unwrap(), nz(50));
    }

    #[test]
    fn test_queue_capacity_derived() {
        assert_eq!(resolve_queue_capacity("0", nz(4)).unwrap(), nz(8));
    }

    #[test]
    fn test_accessors() {
        let config = PoolConfig::new(nz(3), nz(7));
        assert_eq!(config.worker_count().get(), 3);
        assert_eq!(config.queue_capacity().get(), 7);
    }
}
