use crate::http::headers::HeaderMap;
use crate::http::parser::ParserSink;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
    CONNECT,
    TRACE,
}

impl Method {
    /// Parses a method token. Tokens are matched exactly, so lowercase
    /// spellings are rejected.
    pub fn from_bytes(s: &[u8]) -> Option<Self> {
        match s {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"PATCH" => Some(Method::PATCH),
            b"CONNECT" => Some(Method::CONNECT),
            b"TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted protocol versions. Anything else is answered with 505.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// `"<major>.<minor>"`, the shape handlers see in the request record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "1.0",
            Version::Http11 => "1.1",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed request, frozen before dispatch.
///
/// The target is carried as received: no normalization and no
/// percent-decoding. Targets are ASCII under the URI grammar, so octets that
/// are not valid UTF-8 are already malformed; those are replaced with U+FFFD
/// rather than rejected. Header names keep their received casing; repeated
/// names are held as ordered sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    /// Retrieves the first value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Whether the client side of the exchange permits connection reuse.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent;
    /// HTTP/1.0 defaults to close unless `Connection: keep-alive` is sent.
    pub fn keep_alive(&self) -> bool {
        let connection = self.header("Connection");
        match self.version {
            Version::Http11 => !connection
                .map(|v| v.eq_ignore_ascii_case("close"))
                .unwrap_or(false),
            Version::Http10 => connection
                .map(|v| v.eq_ignore_ascii_case("keep-alive"))
                .unwrap_or(false),
        }
    }
}

/// Binds the parser callbacks to a partial request record.
///
/// Spans handed to the callbacks point into the connection's receive buffer,
/// so every span is copied here before the buffer is compacted. `received`
/// tracks how much has been copied for the in-flight request, which is what
/// the connection's size cap is charged against.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    method: Option<Method>,
    version: Option<Version>,
    uri: String,
    headers: HeaderMap,
    body: Vec<u8>,
    received: usize,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes copied out of the receive buffer for the current request.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Freezes the partial record into a `Request`, leaving the assembler
    /// empty for the next message. Returns `None` if the parser never
    /// reported the request line.
    pub fn take(&mut self) -> Option<Request> {
        let method = self.method.take()?;
        let version = self.version.take()?;
        self.received = 0;
        Some(Request {
            method,
            uri: std::mem::take(&mut self.uri),
            version,
            headers: std::mem::take(&mut self.headers),
            body: std::mem::take(&mut self.body),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl ParserSink for RequestAssembler {
    fn on_url(&mut self, raw: &[u8]) {
        self.received += raw.len();
        self.uri = String::from_utf8_lossy(raw).into_owned();
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) {
        self.received += name.len() + value.len();
        self.headers.append(
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        );
    }

    fn on_headers_complete(&mut self, method: Method, version: Version) {
        self.method = Some(method);
        self.version = Some(version);
    }

    fn on_body_chunk(&mut self, chunk: &[u8]) {
        self.received += chunk.len();
        self.body.extend_from_slice(chunk);
    }

    fn on_message_complete(&mut self) {}
}
