//! Response serialization and transmission.
//!
//! Output framing is bit-exact: status line, one header line per value with
//! names emitted as given, an auto-injected `Content-Length` when the body
//! is non-empty and none was supplied, a blank line, then the body. File
//! responses stream the file contents with a `Content-Length` equal to the
//! file size.

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::ServerError;
use crate::http::response::{Response, reason_phrase};

fn serialize_head(buf: &mut Vec<u8>, resp: &Response, content_length: Option<u64>) {
    let status_line = format!("HTTP/1.1 {} {}\r\n", resp.status, reason_phrase(resp.status));
    buf.extend_from_slice(status_line.as_bytes());

    // With an explicit length (file responses) any caller-supplied
    // Content-Length is dropped so the framing stays consistent.
    let skip_content_length = content_length.is_some();
    for (name, value) in resp.headers.lines() {
        if skip_content_length && name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    let auto_length = match content_length {
        Some(n) => Some(n),
        None if !resp.body.is_empty() && !resp.headers.contains("Content-Length") => {
            Some(resp.body.len() as u64)
        }
        None => None,
    };
    if let Some(n) = auto_length {
        buf.extend_from_slice(format!("Content-Length: {}\r\n", n).as_bytes());
    }

    buf.extend_from_slice(b"\r\n");
}

/// Serializes a non-file response to its exact wire bytes.
pub fn serialize(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(resp.body.len() + 256);
    serialize_head(&mut buf, resp, None);
    buf.extend_from_slice(&resp.body);
    buf
}

/// A serialized response being drained to the socket. The whole buffer is
/// flushed before the connection may move on.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize(response),
            written: 0,
        }
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> Result<(), ServerError> {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await
                .map_err(ServerError::Write)?;

            if n == 0 {
                return Err(ServerError::Write(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                )));
            }

            self.written += n;
        }

        Ok(())
    }
}

/// Writes a response, streaming from disk when `file` is set.
pub async fn send(stream: &mut TcpStream, resp: &Response) -> Result<(), ServerError> {
    match &resp.file {
        Some(path) => send_file(stream, resp, path).await,
        None => ResponseWriter::new(resp).write_to_stream(stream).await,
    }
}

async fn send_file(
    stream: &mut TcpStream,
    resp: &Response,
    path: &std::path::Path,
) -> Result<(), ServerError> {
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "file response points at missing file");
            return ResponseWriter::new(&Response::not_found())
                .write_to_stream(stream)
                .await;
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to open file response");
            return ResponseWriter::new(&Response::internal_error())
                .write_to_stream(stream)
                .await;
        }
    };

    let len = file.metadata().await.map_err(ServerError::Read)?.len();
    let mut head = Vec::with_capacity(256);
    serialize_head(&mut head, resp, Some(len));
    stream.write_all(&head).await.map_err(ServerError::Write)?;
    tokio::io::copy(&mut file, stream)
        .await
        .map_err(ServerError::Write)?;
    Ok(())
}
