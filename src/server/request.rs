//! Request head parsing.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

use percent_encoding::percent_decode_str;

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: u64 = 8 * 1024;

/// Parsed HTTP request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Request line without a version (`GET /path`), as sent by HTTP/0.9
    /// clients and bare `nc` sessions.
    pub fn is_simple(&self) -> bool {
        self.version == SIMPLE_VERSION
    }
}

/// Version recorded for request lines that carry none.
const SIMPLE_VERSION: &str = "HTTP/0.9";

/// Errors while reading the request head.
#[derive(Debug)]
pub enum RequestError {
    /// The peer closed the connection before sending anything.
    Empty,
    /// The request line is not `METHOD TARGET [VERSION]`.
    Malformed(String),
    /// The head exceeded [`MAX_HEAD_BYTES`].
    TooLarge,
    /// Reading from the connection failed.
    Io(io::Error),
}

impl RequestError {
    /// Whether the client should get a 400 response.
    pub fn is_client_error(&self) -> bool {
        match self {
            RequestError::Malformed(_) | RequestError::TooLarge => true,
            RequestError::Io(e) => e.kind() == io::ErrorKind::InvalidData,
            RequestError::Empty => false,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Empty => write!(f, "connection closed before request"),
            RequestError::Malformed(line) => write!(f, "malformed request line: {:?}", line),
            RequestError::TooLarge => write!(f, "request head exceeds {} bytes", MAX_HEAD_BYTES),
            RequestError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        RequestError::Io(e)
    }
}

/// Read the request line and skip the header block up to the blank line.
pub fn read_request<R: Read>(stream: R) -> Result<RequestLine, RequestError> {
    let mut reader = BufReader::new(stream.take(MAX_HEAD_BYTES));
    let mut line = String::new();

    if reader.read_line(&mut line)? == 0 {
        return Err(RequestError::Empty);
    }
    if !line.ends_with('\n') && reader.get_ref().limit() == 0 {
        return Err(RequestError::TooLarge);
    }
    let request = parse_request_line(&line)?;

    // A version-less request line has no header block behind it.
    if request.is_simple() {
        return Ok(request);
    }

    // Headers carry nothing we use, but the blank line must be consumed so
    // closing the socket does not reset the peer.
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            if reader.get_ref().limit() == 0 {
                return Err(RequestError::TooLarge);
            }
            break;
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
    }

    Ok(request)
}

/// Parse `METHOD TARGET [VERSION]`.
pub fn parse_request_line(line: &str) -> Result<RequestLine, RequestError> {
    let malformed = || RequestError::Malformed(line.trim_end().to_string());
    let mut parts = line.split_whitespace();

    let method = parts.next().ok_or_else(malformed)?;
    let target = parts.next().ok_or_else(malformed)?;
    let version = parts.next().unwrap_or(SIMPLE_VERSION);

    if parts.next().is_some() || !target.starts_with('/') {
        return Err(malformed());
    }

    Ok(RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
    })
}

/// Turn a request target into a path relative to the served root.
///
/// Drops the query string and fragment, percent-decodes, and refuses any
/// `..` segment. Returns `None` for targets that cannot name a file inside
/// the root.
pub fn relative_path(target: &str) -> Option<PathBuf> {
    let path = target.split(|c| c == '?' || c == '#').next().unwrap_or("");
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\0') || s.contains('\\') => return None,
            s => relative.push(s),
        }
    }
    Some(relative)
}
