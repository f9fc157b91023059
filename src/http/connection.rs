//! Per-connection state and lifecycle.
//!
//! Each accepted socket gets one `Connection`, driven by its own task. The
//! lifecycle is a small state machine:
//!
//! ```text
//!   OPEN ──parser complete──▶ DISPATCHING ──handler done──▶ RESPONDING
//!     ▲                                                        │
//!     └────────────────── keep-alive, buffer compacted ────────┤
//!                                                              ▼
//!   timeout / peer close / error ─────────▶ CLOSING ──▶ CLOSED
//! ```
//!
//! Pipelined requests already sitting in the receive buffer are consumed
//! before the socket is read again, so N buffered requests produce N
//! responses in arrival order.

use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::{self, Handler, HandlerModel};
use crate::http::parser::Parser;
use crate::http::request::{Request, RequestAssembler};
use crate::http::response::Response;
use crate::http::writer;

const READ_CHUNK: usize = 4096;

pub enum ConnState {
    Open,
    Dispatching(Request),
    /// Response plus the request side of the keep-alive decision, captured
    /// before the request was moved into the handler.
    Responding(Response, bool),
    /// Optional best-effort rejection to write before closing.
    Closing(Option<Response>),
    Closed,
}

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    deadline: Instant,
    idle_timeout: Duration,
    max_request_size: usize,
    recv_buf: BytesMut,
    parser: Parser,
    partial: RequestAssembler,
    state: ConnState,
    handler: Arc<dyn Handler>,
    model: HandlerModel,
    shutdown: watch::Receiver<bool>,
    continue_sent: bool,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        config: &Config,
        handler: Arc<dyn Handler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            stream,
            peer,
            deadline: Instant::now() + config.max_lifetime(),
            idle_timeout: config.idle_timeout(),
            max_request_size: config.max_request_size_bytes,
            recv_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: Parser::new(),
            partial: RequestAssembler::new(),
            state: ConnState::Open,
            handler,
            model: config.handler_model,
            shutdown,
            continue_sent: false,
        }
    }

    pub async fn run(&mut self) -> Result<(), ServerError> {
        loop {
            match mem::replace(&mut self.state, ConnState::Closed) {
                ConnState::Open => match self.read_request().await {
                    Ok(Some(request)) => {
                        self.state = ConnState::Dispatching(request);
                    }
                    Ok(None) => {
                        self.state = ConnState::Closing(None);
                    }
                    Err(err) => match err.response_status() {
                        Some(status) => {
                            tracing::debug!(peer = %self.peer, error = %err, status, "request rejected");
                            self.state = ConnState::Closing(Some(Response::rejection(status)));
                        }
                        None => {
                            let _ = self.stream.shutdown().await;
                            return Err(err);
                        }
                    },
                },

                ConnState::Dispatching(request) => {
                    let keep_requested = request.keep_alive();
                    tracing::debug!(
                        peer = %self.peer,
                        method = %request.method,
                        uri = %request.uri,
                        "dispatching request"
                    );
                    self.state = match self.time_window() {
                        None => ConnState::Closing(None),
                        Some(window) => {
                            let handler = Arc::clone(&self.handler);
                            match timeout(window, handler::invoke(handler, self.model, request))
                                .await
                            {
                                Ok(response) => ConnState::Responding(response, keep_requested),
                                Err(_) => {
                                    tracing::debug!(
                                        peer = %self.peer,
                                        "handler timed out, discarding result"
                                    );
                                    ConnState::Closing(None)
                                }
                            }
                        }
                    };
                }

                ConnState::Responding(response, keep_requested) => {
                    let keep = keep_requested
                        && !response.closes_connection()
                        && !*self.shutdown.borrow();
                    let Some(window) = self.time_window() else {
                        self.state = ConnState::Closing(None);
                        continue;
                    };
                    match timeout(window, writer::send(&mut self.stream, &response)).await {
                        Ok(Ok(())) if keep => {
                            self.parser.reset();
                            self.partial.reset();
                            self.continue_sent = false;
                            self.state = ConnState::Open;
                        }
                        Ok(Ok(())) => {
                            self.state = ConnState::Closing(None);
                        }
                        Ok(Err(err)) => return Err(err),
                        Err(_) => {
                            tracing::debug!(peer = %self.peer, "response write timed out");
                            self.state = ConnState::Closing(None);
                        }
                    }
                }

                ConnState::Closing(rejection) => {
                    if let Some(response) = rejection {
                        let _ = timeout(
                            self.idle_timeout,
                            writer::send(&mut self.stream, &response),
                        )
                        .await;
                    }
                    let _ = self.stream.shutdown().await;
                    self.state = ConnState::Closed;
                }

                ConnState::Closed => break,
            }
        }
        Ok(())
    }

    /// How long the connection may still block on one phase: the idle
    /// timeout, clipped by whatever remains of the lifetime deadline.
    /// `None` once the deadline has passed.
    fn time_window(&self) -> Option<Duration> {
        let now = Instant::now();
        if now >= self.deadline {
            return None;
        }
        Some(self.idle_timeout.min(self.deadline - now))
    }

    /// Feeds buffered bytes to the parser, reading more as needed, until a
    /// full request is assembled. `Ok(None)` means the connection should
    /// close quietly: peer EOF, idle timeout, lifetime expiry, or server
    /// shutdown while idle.
    async fn read_request(&mut self) -> Result<Option<Request>, ServerError> {
        loop {
            if !self.recv_buf.is_empty() {
                let consumed = self.parser.advance(&self.recv_buf, &mut self.partial)?;
                if consumed > 0 {
                    self.recv_buf.advance(consumed);
                }
            }

            // 100-continue goes out as soon as the headers are in, before
            // any body byte reaches the handler.
            if self.parser.headers_complete()
                && self.parser.expects_continue()
                && !self.continue_sent
            {
                self.stream
                    .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
                    .await
                    .map_err(ServerError::Write)?;
                self.continue_sent = true;
            }

            if self.parser.is_complete() {
                return Ok(self.partial.take());
            }

            // While the current request is incomplete every buffered byte
            // belongs to it, so this cannot charge a pipelined follow-up.
            if self.recv_buf.len() + self.partial.received() > self.max_request_size {
                return Err(ServerError::RequestTooLarge);
            }

            let Some(window) = self.time_window() else {
                tracing::debug!(peer = %self.peer, "connection exceeded max lifetime");
                return Ok(None);
            };

            self.recv_buf.reserve(READ_CHUNK);
            let idle = self.recv_buf.is_empty() && !self.parser.started();
            let result = if idle {
                let mut shutdown = self.shutdown.clone();
                tokio::select! {
                    r = timeout(window, self.stream.read_buf(&mut self.recv_buf)) => Some(r),
                    _ = shutdown.wait_for(|&stop| stop) => None,
                }
            } else {
                Some(timeout(window, self.stream.read_buf(&mut self.recv_buf)).await)
            };

            let n = match result {
                None => {
                    tracing::debug!(peer = %self.peer, "closing idle connection on shutdown");
                    return Ok(None);
                }
                Some(Err(_)) => {
                    tracing::debug!(peer = %self.peer, "connection timed out");
                    return Ok(None);
                }
                Some(Ok(Ok(n))) => n,
                Some(Ok(Err(e))) => return Err(ServerError::Read(e)),
            };

            if n == 0 {
                return Ok(None);
            }
        }
    }
}
