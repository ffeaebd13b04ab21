//! Static file serving tests

use crate::helpers::*;
use reqwest::StatusCode;

/// Test serving CSS file
#[tokio::test]
async fn test_serve_css_file() {
    let server = TestServer::start();
    let resp = server.get("/styles.css").await;

    assert_status(&resp, StatusCode::OK);
    assert_header_starts_with(&resp, "content-type", "text/css");
}

/// Test Content-Length header on static files
#[tokio::test]
async fn test_static_file_content_length() {
    let server = TestServer::start();
    let resp = server.get("/styles.css").await;

    assert_status(&resp, StatusCode::OK);
    assert_header(&resp, "content-length", "19");
}

/// Test text files
#[tokio::test]
async fn test_serve_text_file() {
    let server = TestServer::start();
    let resp = server.get("/hello.txt").await;

    assert_status(&resp, StatusCode::OK);
    assert_header_starts_with(&resp, "content-type", "text/plain");
    assert_eq!(resp.text().await.unwrap(), "hello world\n");
}

/// Test unknown extensions fall back to octet-stream
#[tokio::test]
async fn test_unknown_extension() {
    let server = TestServer::start();
    std::fs::write(server.root.path().join("data.zzq"), [1u8, 2, 3]).unwrap();
    let resp = server.get("/data.zzq").await;

    assert_status(&resp, StatusCode::OK);
    assert_header(&resp, "content-type", "application/octet-stream");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &[1u8, 2, 3]);
}

/// Test percent-encoded file names
#[tokio::test]
async fn test_percent_encoded_name() {
    let server = TestServer::start();
    let resp = server.get("/with%20space.txt").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "spaced out");
}

/// Test subdirectory index
#[tokio::test]
async fn test_subdirectory_index() {
    let server = TestServer::start();
    let resp = server.get("/docs/").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "<h1>docs</h1>");
}

/// Test 404 for non-existent static file
#[tokio::test]
async fn test_static_file_not_found() {
    let server = TestServer::start();
    let resp = server.get("/missing.css").await;

    assert_status(&resp, StatusCode::NOT_FOUND);
}

/// Test files larger than the socket buffers arrive intact
#[tokio::test]
async fn test_large_file() {
    let server = TestServer::start();
    let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(server.root.path().join("large.bin"), &payload).unwrap();

    let resp = server.get("/large.bin").await;
    assert_status(&resp, StatusCode::OK);
    assert_header(&resp, "content-length", "1000000");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), payload.as_slice());
}

/// Test more concurrent clients than workers and queue slots
#[tokio::test]
async fn test_concurrent_requests() {
    let server = TestServer::start();
    let mut tasks = tokio::task::JoinSet::new();

    for _ in 0..20 {
        let client = server.client.clone();
        let url = format!("{}/hello.txt", server.base_url);
        tasks.spawn(async move { client.get(url).send().await.map(|r| r.status()) });
    }

    let mut ok = 0;
    while let Some(result) = tasks.join_next().await {
        let status = result.expect("task panicked").expect("request failed");
        assert_eq!(status, StatusCode::OK);
        ok += 1;
    }
    assert_eq!(ok, 20);
}
