//! Incremental, callback-driven HTTP/1.1 request parser.
//!
//! One `Parser` lives on each connection and is fed slices of the receive
//! buffer as they arrive. Request line and header lines are only consumed
//! once a full CRLF-terminated line is buffered, so a token split across
//! two reads is reassembled for free: the partial line simply stays in the
//! buffer until the next read. Body bytes are consumed as they come.
//!
//! `advance` returns how many bytes it consumed; the connection drains that
//! many from its buffer afterwards. Everything the parser reports goes
//! through a [`ParserSink`], whose spans borrow from the input slice and
//! must be copied before the buffer is compacted.

use crate::error::ParseError;
use crate::http::request::{Method, Version};

/// Receives parse events. Spans point into the slice passed to `advance`
/// and are only valid for the duration of the callback.
pub trait ParserSink {
    fn on_url(&mut self, raw: &[u8]);
    fn on_header(&mut self, name: &[u8], value: &[u8]);
    fn on_headers_complete(&mut self, method: Method, version: Version);
    fn on_body_chunk(&mut self, chunk: &[u8]);
    fn on_message_complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RequestLine,
    Headers,
    FixedBody { remaining: usize },
    ChunkSize,
    ChunkData { remaining: usize },
    ChunkDataEnd,
    Trailers,
    Complete,
}

/// Per-connection parser state machine.
#[derive(Debug)]
pub struct Parser {
    state: State,
    method: Option<Method>,
    version: Option<Version>,
    content_length: Option<usize>,
    chunked: bool,
    saw_host: bool,
    expect_continue: bool,
    headers_done: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::RequestLine,
            method: None,
            version: None,
            content_length: None,
            chunked: false,
            saw_host: false,
            expect_continue: false,
            headers_done: false,
        }
    }

    /// Re-arms the parser for the next request on a kept-alive connection.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether any part of a request line has been consumed. A false value
    /// together with an empty receive buffer means the connection is idle
    /// between requests.
    pub fn started(&self) -> bool {
        self.state != State::RequestLine
    }

    pub fn headers_complete(&self) -> bool {
        self.headers_done
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Whether the request carried `Expect: 100-continue`.
    pub fn expects_continue(&self) -> bool {
        self.expect_continue
    }

    /// Consumes as much of `buf` as possible, reporting events to `sink`.
    /// Returns the number of bytes consumed. Stops consuming at message
    /// completion so pipelined bytes stay in the buffer.
    pub fn advance<S: ParserSink>(
        &mut self,
        buf: &[u8],
        sink: &mut S,
    ) -> Result<usize, ParseError> {
        let mut pos = 0;
        loop {
            match self.state {
                State::RequestLine => {
                    let Some(eol) = find_crlf(&buf[pos..]) else {
                        return Ok(pos);
                    };
                    self.parse_request_line(&buf[pos..pos + eol], sink)?;
                    pos += eol + 2;
                    self.state = State::Headers;
                }

                State::Headers => {
                    let Some(eol) = find_crlf(&buf[pos..]) else {
                        return Ok(pos);
                    };
                    if eol == 0 {
                        pos += 2;
                        self.finish_headers(sink)?;
                        if self.state == State::Complete {
                            sink.on_message_complete();
                            return Ok(pos);
                        }
                    } else {
                        self.parse_header_line(&buf[pos..pos + eol], sink)?;
                        pos += eol + 2;
                    }
                }

                State::FixedBody { remaining } => {
                    let avail = buf.len() - pos;
                    if avail == 0 {
                        return Ok(pos);
                    }
                    let take = avail.min(remaining);
                    sink.on_body_chunk(&buf[pos..pos + take]);
                    pos += take;
                    if take == remaining {
                        self.state = State::Complete;
                        sink.on_message_complete();
                        return Ok(pos);
                    }
                    self.state = State::FixedBody {
                        remaining: remaining - take,
                    };
                    return Ok(pos);
                }

                State::ChunkSize => {
                    let Some(eol) = find_crlf(&buf[pos..]) else {
                        return Ok(pos);
                    };
                    let size = parse_chunk_size(&buf[pos..pos + eol])?;
                    pos += eol + 2;
                    self.state = if size == 0 {
                        State::Trailers
                    } else {
                        State::ChunkData { remaining: size }
                    };
                }

                State::ChunkData { remaining } => {
                    let avail = buf.len() - pos;
                    if avail == 0 {
                        return Ok(pos);
                    }
                    let take = avail.min(remaining);
                    sink.on_body_chunk(&buf[pos..pos + take]);
                    pos += take;
                    if take == remaining {
                        self.state = State::ChunkDataEnd;
                    } else {
                        self.state = State::ChunkData {
                            remaining: remaining - take,
                        };
                        return Ok(pos);
                    }
                }

                State::ChunkDataEnd => {
                    if buf.len() - pos < 2 {
                        return Ok(pos);
                    }
                    if &buf[pos..pos + 2] != b"\r\n" {
                        return Err(ParseError::InvalidChunk);
                    }
                    pos += 2;
                    self.state = State::ChunkSize;
                }

                State::Trailers => {
                    let Some(eol) = find_crlf(&buf[pos..]) else {
                        return Ok(pos);
                    };
                    pos += eol + 2;
                    // Trailer fields are consumed but not reported.
                    if eol == 0 {
                        self.state = State::Complete;
                        sink.on_message_complete();
                        return Ok(pos);
                    }
                }

                State::Complete => return Ok(pos),
            }
        }
    }

    fn parse_request_line<S: ParserSink>(
        &mut self,
        line: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError> {
        let mut parts = line.split(|&b| b == b' ').filter(|p| !p.is_empty());
        let method_token = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        let target = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        let version_token = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        if parts.next().is_some() {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_bytes(method_token).ok_or(ParseError::InvalidMethod)?;
        let version = match version_token {
            b"HTTP/1.1" => Version::Http11,
            b"HTTP/1.0" => Version::Http10,
            v if v.starts_with(b"HTTP/") => return Err(ParseError::UnsupportedVersion),
            _ => return Err(ParseError::InvalidRequestLine),
        };

        self.method = Some(method);
        self.version = Some(version);
        sink.on_url(target);
        Ok(())
    }

    fn parse_header_line<S: ParserSink>(
        &mut self,
        line: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError> {
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::InvalidHeader)?;
        if colon == 0 {
            return Err(ParseError::InvalidHeader);
        }
        let name = line[..colon].trim_ascii();
        let value = line[colon + 1..].trim_ascii();

        if name.eq_ignore_ascii_case(b"content-length") {
            // Only a bare digit string is a valid length. `usize::parse` would
            // also accept a leading `+`, which the grammar does not.
            if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
                return Err(ParseError::InvalidContentLength);
            }
            let parsed = std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or(ParseError::InvalidContentLength)?;
            match self.content_length {
                Some(prev) if prev != parsed => return Err(ParseError::InvalidContentLength),
                _ => self.content_length = Some(parsed),
            }
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            if contains_token(value, b"chunked") {
                self.chunked = true;
            }
        } else if name.eq_ignore_ascii_case(b"host") {
            self.saw_host = true;
        } else if name.eq_ignore_ascii_case(b"expect")
            && value.eq_ignore_ascii_case(b"100-continue")
        {
            self.expect_continue = true;
        }

        sink.on_header(name, value);
        Ok(())
    }

    /// Decides body framing once the blank line after the headers arrives.
    /// Chunked transfer wins over Content-Length; with neither, the body is
    /// empty and the message is complete.
    fn finish_headers<S: ParserSink>(&mut self, sink: &mut S) -> Result<(), ParseError> {
        let method = self.method.ok_or(ParseError::InvalidRequestLine)?;
        let version = self.version.ok_or(ParseError::InvalidRequestLine)?;

        if version == Version::Http11 && !self.saw_host {
            return Err(ParseError::MissingHost);
        }

        self.headers_done = true;
        sink.on_headers_complete(method, version);

        self.state = if self.chunked {
            State::ChunkSize
        } else {
            match self.content_length {
                Some(n) if n > 0 => State::FixedBody { remaining: n },
                _ => State::Complete,
            }
        };
        Ok(())
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Case-insensitive membership test in a comma-separated token list, as in
/// `Transfer-Encoding: gzip, chunked`.
fn contains_token(value: &[u8], token: &[u8]) -> bool {
    value
        .split(|&b| b == b',')
        .any(|part| part.trim_ascii().eq_ignore_ascii_case(token))
}

/// Parses a chunk-size line, ignoring any chunk extensions after `;`.
fn parse_chunk_size(line: &[u8]) -> Result<usize, ParseError> {
    let digits = match line.iter().position(|&b| b == b';') {
        Some(i) => &line[..i],
        None => line,
    };
    let digits = digits.trim_ascii();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(ParseError::InvalidChunk);
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| usize::from_str_radix(s, 16).ok())
        .ok_or(ParseError::InvalidChunk)
}
