//! Static file handler run by the worker pool.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use super::request::{read_request, relative_path, RequestError};
use super::response::{write_file, write_status, Status};
use crate::listener::Connection;
use crate::logging::ACCESS_TARGET;
use crate::pool::ConnectionHandler;

/// Outcome of one served request, used for the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub method: String,
    pub path: String,
    pub status: Status,
    pub bytes: u64,
}

impl Served {
    fn new(method: &str, path: &str, status: Status, bytes: u64) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            bytes,
        }
    }
}

/// Serves files below a root directory, one request per connection.
#[derive(Debug, Clone)]
pub struct FileHandler {
    root: PathBuf,
    index_file: Option<String>,
}

impl FileHandler {
    /// `root` must be canonical; resolved paths are checked to stay under it.
    pub fn new(root: PathBuf, index_file: Option<String>) -> Self {
        Self { root, index_file }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request target to an existing regular file under the root.
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let mut path = self.root.join(relative_path(target)?);
        if path.is_dir() {
            path.push(self.index_file.as_deref()?);
        }

        // Symlinks may point anywhere, so the check runs on the real path.
        let canonical = path.canonicalize().ok()?;
        if canonical.starts_with(&self.root) && canonical.is_file() {
            Some(canonical)
        } else {
            None
        }
    }

    /// Read one request from `stream` and write the response.
    ///
    /// An `Err` means the connection itself failed and nothing useful could
    /// be sent back.
    pub fn serve<S: Read + Write>(&self, stream: &mut S) -> io::Result<Served> {
        let request = match read_request(&mut *stream) {
            Ok(request) => request,
            Err(e) if e.is_client_error() => {
                debug!(error = %e, "bad request");
                write_status(stream, Status::BadRequest)?;
                return Ok(Served::new("-", "-", Status::BadRequest, 0));
            }
            Err(RequestError::Io(e)) => return Err(e),
            Err(e) => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string())),
        };

        let method = request.method.as_str();
        let target = request.target.as_str();

        let head_only = match method {
            "GET" => false,
            "HEAD" => true,
            _ => {
                write_status(stream, Status::MethodNotAllowed)?;
                return Ok(Served::new(method, target, Status::MethodNotAllowed, 0));
            }
        };

        let file = self
            .resolve(target)
            .and_then(|path| File::open(&path).ok().map(|file| (path, file)));

        match file {
            Some((path, file)) => {
                let bytes = write_file(stream, file, &path, head_only)?;
                Ok(Served::new(method, target, Status::Ok, bytes))
            }
            None => {
                write_status(stream, Status::NotFound)?;
                Ok(Served::new(method, target, Status::NotFound, 0))
            }
        }
    }
}

impl<C> ConnectionHandler<C> for FileHandler
where
    C: Connection + Read + Write,
{
    fn handle(&self, conn: &mut C) {
        let started = Instant::now();
        let peer = conn.peer_addr();

        match self.serve(conn) {
            Ok(served) => info!(
                target: ACCESS_TARGET,
                method = %served.method,
                path = %served.path,
                status = served.status.code() as u64,
                bytes = served.bytes,
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                peer = ?peer,
            ),
            Err(e) => debug!(peer = ?peer, error = %e, "connection dropped"),
        }
    }
}
