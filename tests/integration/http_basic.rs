//! Basic HTTP tests: GET, HEAD, 404, 405, malformed requests.

use crate::helpers::*;
use reqwest::StatusCode;

/// Test GET request to the root serves the index file
#[tokio::test]
async fn test_get_index() {
    let server = TestServer::start();
    let resp = server.get("/").await;

    assert_status(&resp, StatusCode::OK);
    assert_header_starts_with(&resp, "content-type", "text/html");
    assert_eq!(resp.text().await.unwrap(), "<h1>queue_httpd</h1>");
}

/// Test query strings are ignored when resolving the file
#[tokio::test]
async fn test_get_with_query_params() {
    let server = TestServer::start();
    let resp = server.get("/hello.txt?name=TestUser&v=2").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "hello world\n");
}

/// Test HEAD returns headers without a body
#[tokio::test]
async fn test_head_request() {
    let server = TestServer::start();
    let resp = server.head("/hello.txt").await;

    assert_status(&resp, StatusCode::OK);
    assert_header(&resp, "content-length", "12");
    assert!(resp.bytes().await.unwrap().is_empty());
}

/// Test 404 for non-existent file
#[tokio::test]
async fn test_404_not_found() {
    let server = TestServer::start();
    let resp = server.get("/nonexistent.txt").await;

    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_header(&resp, "content-length", "0");
}

/// Test POST is refused
#[tokio::test]
async fn test_post_not_allowed() {
    let server = TestServer::start();
    let resp = server
        .client
        .post(format!("{}/hello.txt", server.base_url))
        .send()
        .await
        .expect("POST request failed");

    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);
}

/// Test Server header on every response
#[tokio::test]
async fn test_server_header() {
    let server = TestServer::start();
    let resp = server.get("/missing").await;

    assert_header_starts_with(&resp, "server", "queue_httpd/");
}

/// Test a plain HTTP/1.0 request without headers
#[test]
fn test_raw_http10_request() {
    let server = TestServer::start();
    let response = server.raw_request("GET /docs/guide.txt HTTP/1.0\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.contains("Content-Length: 7\r\n"));
    assert!(response.ends_with("\r\n\r\nread me"));
}

/// Test a garbage request line gets 400
#[test]
fn test_malformed_request() {
    let server = TestServer::start();
    let response = server.raw_request("NONSENSE\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"), "{}", response);
}

/// Test parent directory segments never escape the root
#[test]
fn test_path_traversal() {
    let server = TestServer::start();
    std::fs::write(server.root.path().join("../queue_httpd_outside.txt"), "outside").ok();

    for target in [
        "/../queue_httpd_outside.txt",
        "/docs/../../queue_httpd_outside.txt",
        "/%2e%2e/queue_httpd_outside.txt",
    ] {
        let response = server.raw_request(&format!("GET {} HTTP/1.0\r\n\r\n", target));
        assert!(
            response.starts_with("HTTP/1.0 404 Not Found\r\n"),
            "{} -> {}",
            target,
            response
        );
        assert!(!response.contains("outside"));
    }

    let _ = std::fs::remove_file(server.root.path().join("../queue_httpd_outside.txt"));
}

/// Test a client that connects and sends nothing does not wedge a worker
#[test]
fn test_silent_client_times_out() {
    let server = TestServer::start_with(1, 2, std::time::Duration::from_millis(300));
    let _silent = std::net::TcpStream::connect(server.addr).unwrap();

    let response = server.raw_request("GET /hello.txt HTTP/1.0\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
}

/// Test a version-less request line is answered without waiting for headers
#[test]
fn test_request_without_version() {
    let server = TestServer::start_with(1, 2, std::time::Duration::from_secs(5));
    let started = std::time::Instant::now();
    let response = server.raw_request("GET /hello.txt\r\n");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
    assert!(response.ends_with("hello world\n"));
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}

/// Test a zero IO timeout disables the timeout instead of breaking sockets
#[test]
fn test_zero_io_timeout() {
    let server = TestServer::start_with(1, 2, std::time::Duration::ZERO);
    let response = server.raw_request("GET /hello.txt HTTP/1.0\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
}
