//! HTTP/1.0 response writing.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// `Server` header value.
pub const SERVER_NAME: &str = concat!("queue_httpd/", env!("CARGO_PKG_VERSION"));

/// Response statuses this server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

fn head(status: Status, content_type: Option<&str>, content_length: u64) -> String {
    let mut head = format!("HTTP/1.0 {}\r\n", status);
    if let Some(content_type) = content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nServer: {}\r\nConnection: close\r\n\r\n",
        content_length, SERVER_NAME
    ));
    head
}

/// Write a bodyless response.
pub fn write_status<W: Write>(out: &mut W, status: Status) -> io::Result<()> {
    out.write_all(head(status, None, 0).as_bytes())?;
    out.flush()
}

/// Write a 200 response for `file`. Returns the number of body bytes sent.
///
/// The content type is guessed from the extension of `path`. With
/// `head_only` the headers still carry the file length but no body follows.
pub fn write_file<W: Write>(
    out: &mut W,
    file: File,
    path: &Path,
    head_only: bool,
) -> io::Result<u64> {
    let len = file.metadata()?.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    out.write_all(head(Status::Ok, Some(mime.as_ref()), len).as_bytes())?;

    let sent = if head_only {
        0
    } else {
        io::copy(&mut file.take(len), out)?
    };
    out.flush()?;
    Ok(sent)
}
