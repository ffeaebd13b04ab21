//! TCP socket setup and connection wrapper.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use super::{Connection, ListenerConfig};

/// Create a non-blocking listening socket ready to be handed to the acceptor.
pub fn bind(config: &ListenerConfig) -> io::Result<TcpListener> {
    let domain = if config.addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&config.addr.into())?;
    socket.listen(config.backlog)?;

    Ok(socket.into())
}

/// An accepted TCP connection in blocking mode.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpConnection {
    /// Wrap an accepted stream, switching it to blocking I/O with the given timeout.
    ///
    /// A zero timeout means no timeout; the socket API would reject it.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, timeout: Option<Duration>) -> io::Result<Self> {
        let timeout = timeout.filter(|t| !t.is_zero());
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(error = %e, "failed to set TCP_NODELAY");
        }

        Ok(Self { stream, peer_addr })
    }
}

impl Connection for TcpConnection {
    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer_addr)
    }

    fn close(self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            // Peer already gone; dropping the stream still frees the descriptor.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
