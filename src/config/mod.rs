//! Configuration module for queue_httpd.
//!
//! Configuration comes from environment variables, with the served
//! directory and port optionally overridden by positional arguments.
//!
//! # Example
//!
//! ```rust,ignore
//! use queue_httpd::config::Config;
//!
//! let config = Config::from_env()?.with_args(std::env::args().skip(1))?;
//! println!("Listen address: {}", config.server.listen_addr);
//! println!("Workers: {}", config.pool.worker_count());
//! ```

mod error;
mod logging;
mod parse;
mod pool;
mod server;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use parse::parse_duration;
pub use pool::{PoolConfig, DEFAULT_WORKERS};
pub use server::{IoTimeout, ServerConfig, DEFAULT_INDEX_FILE};

use parse::parse_value;

/// Command-line usage line.
pub const USAGE: &str = "usage: queue_httpd [DIRECTORY] [PORT]";

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Worker pool configuration.
    pub pool: PoolConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            pool: PoolConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Apply positional arguments: `[DIRECTORY] [PORT]`.
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        match args.as_slice() {
            [] => {}
            [dir] => self.server.serve_dir = dir.as_ref().into(),
            [dir, port] => {
                self.server.serve_dir = dir.as_ref().into();
                let port: u16 = parse_value("PORT", port.as_ref())?;
                self.server.listen_addr.set_port(port);
            }
            _ => return Err(ConfigError::Usage(USAGE.to_string())),
        }
        Ok(self)
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Listen: {}", self.server.listen_addr);
        info!("  Serve dir: {:?}", self.server.serve_dir);
        info!("  Workers: {}", self.pool.worker_count());
        info!("  Queue capacity: {}", self.pool.queue_capacity());
        info!("  Listen backlog: {}", self.server.listen_backlog);

        match self.server.index_file {
            Some(ref index) => info!("  Index file: {}", index),
            None => info!("  Index file: disabled"),
        }

        match self.server.io_timeout.as_duration() {
            Some(timeout) => info!("  IO timeout: {:?}", timeout),
            None => info!("  IO timeout: disabled"),
        }
    }
}
