//! Listening socket and accepted connection handles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  bind(ListenerConfig)  ──►  std TcpListener (socket2)    │
//! │                                   │                      │
//! │                          Dispatcher::run (tokio accept)  │
//! │                                   │                      │
//! │                           TcpConnection (blocking)       │
//! │                                   │                      │
//! │                      BoundedQueue ──► worker ──► close() │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod tcp;

pub use tcp::{bind, TcpConnection};

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// A connection handle owned by exactly one party at a time.
///
/// Workers call [`Connection::close`] once after the handler returns,
/// whatever the handler's outcome.
pub trait Connection: Send + 'static {
    /// Remote address of the peer, if known.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Release the underlying resource.
    fn close(self) -> io::Result<()>;
}

/// Socket setup parameters.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
    /// Pending-connection backlog passed to listen(2).
    pub backlog: i32,
    /// Read/write timeout applied to each accepted connection.
    pub io_timeout: Option<Duration>,
}

impl ListenerConfig {
    /// Create a TCP listener configuration with default backlog and no timeout.
    pub fn tcp(addr: SocketAddr) -> Self {
        Self {
            addr,
            backlog: 128,
            io_timeout: None,
        }
    }

    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_listener_config_tcp() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
        let config = ListenerConfig::tcp(addr);

        assert_eq!(config.addr, addr);
        assert_eq!(config.backlog, 128);
        assert!(config.io_timeout.is_none());
    }

    #[test]
    fn test_listener_config_builders() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let config = ListenerConfig::tcp(addr)
            .with_backlog(5)
            .with_io_timeout(Some(Duration::from_secs(3)));

        assert_eq!(config.backlog, 5);
        assert_eq!(config.io_timeout, Some(Duration::from_secs(3)));
    }
}
