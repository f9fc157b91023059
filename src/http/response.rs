use std::path::PathBuf;

use crate::http::headers::HeaderMap;

/// Reason phrase for a status code.
///
/// Known codes use the IANA phrase; unknown codes inside a class fall back
/// to a generic phrase for the class, and anything out of range gets an
/// empty phrase.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a Teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        100..=199 => "Information",
        200..=299 => "Success",
        300..=399 => "Redirection",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "",
    }
}

/// A response record ready for serialization.
///
/// `file`, when set, overrides `body`: the serializer streams the file with
/// a `Content-Length` equal to its size, or answers 404 if it is missing.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub file: Option<PathBuf>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: Vec::new(),
            file: None,
        }
    }
}

/// Builder for constructing responses in a fluent style.
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn new(status: u16) -> Self {
        Self {
            response: Response {
                status,
                ..Response::default()
            },
        }
    }

    /// Adds a header line. Repeating a name produces one output line per
    /// value, in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Streams the file at `path` instead of `body`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.response.file = Some(path.into());
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

impl Response {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(200).body(body).build()
    }

    /// The 404 sent when a `file` response points at a missing path.
    pub fn not_found() -> Self {
        ResponseBuilder::new(404).body("404 Not Found").build()
    }

    /// The canonical 500 for a failed or panicked handler.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(500)
            .header("Content-Type", "text/plain")
            .body("Internal Server Error")
            .build()
    }

    /// Best-effort rejection sent before the connection closes (400, 413,
    /// 505).
    pub fn rejection(status: u16) -> Self {
        ResponseBuilder::new(status)
            .header("Connection", "close")
            .header("Content-Type", "text/plain")
            .body(format!("{} {}", status, reason_phrase(status)))
            .build()
    }

    /// Whether this response forbids reusing the connection.
    pub fn closes_connection(&self) -> bool {
        self.headers
            .get("Connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }
}
