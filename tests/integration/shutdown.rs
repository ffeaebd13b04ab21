//! Shutdown ordering: in-flight work, queued connections, blocked acceptor.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use crate::helpers::*;

/// Read until EOF or error; returns what arrived.
fn drain(mut stream: TcpStream) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf);
    buf
}

/// Test stopping a server that never saw a connection
#[test]
fn test_stop_idle_server() {
    let server = TestServer::start();
    let summary = server.stop();

    assert_eq!(summary.dispatch.accepted, 0);
    assert_eq!(summary.pool.served, 0);
    assert_eq!(summary.undelivered, 0);
}

/// Test summary counts served requests
#[test]
fn test_summary_counts_requests() {
    let server = TestServer::start();
    for _ in 0..3 {
        let response = server.raw_request("GET /hello.txt HTTP/1.0\r\n\r\n");
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    }

    let summary = server.stop();
    assert_eq!(summary.dispatch.accepted, 3);
    assert_eq!(summary.dispatch.enqueued, 3);
    assert_eq!(summary.dispatch.rejected, 0);
    assert_eq!(summary.pool.served, 3);
    assert_eq!(summary.pool.handler_panics, 0);
}

/// Test the listener refuses connections after shutdown
#[test]
fn test_listener_closed_after_stop() {
    let server = TestServer::start();
    let addr = server.addr;
    server.stop();

    assert!(TcpStream::connect_timeout(&addr, Duration::from_millis(500)).is_err());
}

/// One worker busy, one connection queued, the acceptor blocked on a full
/// queue: shutdown lets the busy request finish, closes the queued
/// connection unanswered and the acceptor closes the one it was holding.
#[test]
fn test_shutdown_with_full_queue() {
    let server = TestServer::start_with(1, 1, Duration::from_millis(800));

    // Occupies the only worker until its read times out.
    let busy = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(200));
    // Fills the single queue slot.
    let queued = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(200));
    // Accepted, then held by the acceptor blocked in enqueue.
    let held = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(200));

    let summary = server.stop();

    assert_eq!(summary.dispatch.accepted, 3);
    assert_eq!(summary.dispatch.enqueued, 2);
    assert_eq!(summary.dispatch.rejected, 1);
    assert_eq!(summary.undelivered, 1);

    assert!(drain(busy).is_empty());
    assert!(drain(queued).is_empty());
    assert!(drain(held).is_empty());
}

/// Test a request already being written when shutdown starts still completes
#[test]
fn test_in_flight_request_completes() {
    let server = TestServer::start_with(1, 1, Duration::from_secs(5));

    let mut client = TcpStream::connect(server.addr).unwrap();
    client.write_all(b"GET /hello.txt HTTP/1.0\r\n").unwrap();
    thread::sleep(Duration::from_millis(200));

    let stopper = thread::spawn(move || server.stop());
    thread::sleep(Duration::from_millis(200));
    client.write_all(b"\r\n").unwrap();

    let response = String::from_utf8(drain(client)).unwrap();
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
    assert!(response.ends_with("hello world\n"));

    let summary = stopper.join().unwrap();
    assert_eq!(summary.pool.served, 1);
}
