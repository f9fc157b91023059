use std::io;

/// Malformed or unsupported HTTP in the request stream.
///
/// Every variant maps to the status code the connection answers with
/// before closing; see [`ParseError::status`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequestLine,

    #[error("unknown request method")]
    InvalidMethod,

    #[error("unsupported HTTP version")]
    UnsupportedVersion,

    #[error("malformed header line")]
    InvalidHeader,

    #[error("invalid content length")]
    InvalidContentLength,

    #[error("missing Host header in HTTP/1.1 request")]
    MissingHost,

    #[error("invalid chunk framing")]
    InvalidChunk,
}

impl ParseError {
    /// Status code used for the best-effort error response.
    pub fn status(&self) -> u16 {
        match self {
            ParseError::UnsupportedVersion => 505,
            _ => 400,
        }
    }
}

/// Server and per-connection failures.
///
/// Listener-level errors (`Bind`, `Listen`) are fatal for startup;
/// everything else is contained to the connection it happened on.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to listen on {addr}: {source}")]
    Listen { addr: String, source: io::Error },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("request exceeds maximum size")]
    RequestTooLarge,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ServerError {
    /// Status code for errors that get a best-effort response before the
    /// connection closes. I/O failures get none.
    pub fn response_status(&self) -> Option<u16> {
        match self {
            ServerError::Parse(e) => Some(e.status()),
            ServerError::RequestTooLarge => Some(413),
            _ => None,
        }
    }
}
