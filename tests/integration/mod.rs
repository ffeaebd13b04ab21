//! Integration tests for queue_httpd
//!
//! Each test starts its own server on 127.0.0.1 with an ephemeral port and
//! a temporary directory of fixture files.
//! Run with: cargo test --test integration

mod helpers;

mod http_basic;
mod shutdown;
mod static_files;
