//! Test helpers and utilities

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::num::NonZeroUsize;
use std::thread::JoinHandle;
use std::time::Duration;

use queue_httpd::config::{IoTimeout, PoolConfig, ServerConfig};
use queue_httpd::{Server, ServerError, ServerSummary, ShutdownSignal};
use reqwest::{Client, Response, StatusCode};
use tempfile::TempDir;

/// In-process server on an ephemeral port, serving a fixture directory.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub client: Client,
    pub root: TempDir,
    shutdown: ShutdownSignal,
    handle: Option<JoinHandle<Result<ServerSummary, ServerError>>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Two workers, four queue slots, 5s IO timeout.
    pub fn start() -> Self {
        Self::start_with(2, 4, Duration::from_secs(5))
    }

    pub fn start_with(workers: usize, capacity: usize, io_timeout: Duration) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        write_fixtures(&root);

        let mut server_config = ServerConfig::new("127.0.0.1:0".parse().unwrap(), root.path());
        server_config.io_timeout = IoTimeout(Some(io_timeout));
        let pool_config = PoolConfig::new(
            NonZeroUsize::new(workers).expect("workers must be non-zero"),
            NonZeroUsize::new(capacity).expect("capacity must be non-zero"),
        );

        let server = Server::bind(&server_config, &pool_config).expect("Failed to bind server");
        let addr = server.local_addr();
        let shutdown = server.shutdown_signal();

        let handle = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build runtime");
            runtime.block_on(server.run(std::future::pending()))
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", addr),
            addr,
            client,
            root,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Make a GET request to the server
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Make a HEAD request to the server
    pub async fn head(&self, path: &str) -> Response {
        self.client
            .head(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("HEAD request failed")
    }

    /// Send raw bytes and read until the server closes the connection.
    pub fn raw_request(&self, request: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).expect("connect failed");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        stream.write_all(request.as_bytes()).expect("write failed");

        let mut response = Vec::new();
        stream.read_to_end(&mut response).expect("read failed");
        String::from_utf8_lossy(&response).into_owned()
    }

    /// Trigger shutdown and wait for the server thread.
    pub fn stop(mut self) -> ServerSummary {
        self.shutdown.trigger();
        self.handle
            .take()
            .expect("server already stopped")
            .join()
            .expect("server thread panicked")
            .expect("server returned an error")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shutdown.trigger();
            let _ = handle.join();
        }
    }
}

fn write_fixtures(root: &TempDir) {
    let dir = root.path();
    std::fs::create_dir_all(dir.join("docs")).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>queue_httpd</h1>").unwrap();
    std::fs::write(dir.join("hello.txt"), "hello world\n").unwrap();
    std::fs::write(dir.join("styles.css"), "body { margin: 0; }").unwrap();
    std::fs::write(dir.join("with space.txt"), "spaced out").unwrap();
    std::fs::write(dir.join("docs/index.html"), "<h1>docs</h1>").unwrap();
    std::fs::write(dir.join("docs/guide.txt"), "read me").unwrap();
}

/// Assert that response has expected status
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that response contains header
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .unwrap();
    assert_eq!(value, expected, "Header '{}' mismatch", name);
}

/// Assert that response contains header with prefix
pub fn assert_header_starts_with(response: &Response, name: &str, prefix: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .unwrap();
    assert!(
        value.starts_with(prefix),
        "Header '{}' expected to start with '{}', got '{}'",
        name,
        prefix,
        value
    );
}
