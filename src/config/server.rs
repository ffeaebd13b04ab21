//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::parse::{env_duration, env_or, env_parse, parse_value};
use super::ConfigError;
use crate::listener::ListenerConfig;

/// Default directory index.
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Per-connection read/write timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoTimeout(pub Option<Duration>);

impl IoTimeout {
    #[inline]
    pub fn as_duration(&self) -> Option<Duration> {
        self.0
    }
}

impl Default for IoTimeout {
    fn default() -> Self {
        Self(Some(Duration::from_secs(30)))
    }
}

/// Server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0:8080).
    pub listen_addr: SocketAddr,
    /// Directory whose files are served (default: current directory).
    pub serve_dir: PathBuf,
    /// File served for directory targets; `None` disables.
    pub index_file: Option<String>,
    /// listen(2) backlog.
    pub listen_backlog: i32,
    /// Read/write timeout on accepted connections.
    pub io_timeout: IoTimeout,
}

impl ServerConfig {
    /// Configuration for serving `serve_dir` on `listen_addr` with defaults elsewhere.
    pub fn new(listen_addr: SocketAddr, serve_dir: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr,
            serve_dir: serve_dir.into(),
            index_file: Some(DEFAULT_INDEX_FILE.to_string()),
            listen_backlog: 128,
            io_timeout: IoTimeout::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = parse_value("LISTEN_ADDR", &env_or("LISTEN_ADDR", "0.0.0.0:8080"))?;

        let index_file = match env_or("INDEX_FILE", DEFAULT_INDEX_FILE).trim() {
            "" => None,
            v if v.eq_ignore_ascii_case("off") => None,
            v => Some(v.to_string()),
        };

        let listen_backlog: i32 = env_parse("LISTEN_BACKLOG", 128)?;
        if listen_backlog <= 0 {
            return Err(ConfigError::Invalid {
                key: "LISTEN_BACKLOG".into(),
                message: "backlog must be positive".into(),
            });
        }

        Ok(Self {
            listen_addr,
            serve_dir: PathBuf::from(env_or("SERVE_DIR", ".")),
            index_file,
            listen_backlog,
            io_timeout: IoTimeout(env_duration("IO_TIMEOUT", "30s")?),
        })
    }

    /// Canonical absolute path of the served directory.
    ///
    /// Fails if the directory does not exist or is not a directory.
    pub fn canonical_serve_dir(&self) -> Result<PathBuf, ConfigError> {
        let path = self
            .serve_dir
            .canonicalize()
            .map_err(|error| ConfigError::Io {
                path: self.serve_dir.display().to_string(),
                error,
            })?;

        if !path.is_dir() {
            return Err(ConfigError::Invalid {
                key: "SERVE_DIR".into(),
                message: format!("{} is not a directory", path.display()),
            });
        }
        Ok(path)
    }

    /// Socket parameters for the listener.
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig::tcp(self.listen_addr)
            .with_backlog(self.listen_backlog)
            .with_io_timeout(self.io_timeout.as_duration())
    }
}
