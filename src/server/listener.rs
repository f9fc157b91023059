//! The listening side: bind, accept, connection registry, shutdown.
//!
//! The server owns the listener and a registry of connection tasks. Each
//! accepted socket is handed to its own task, which owns the connection
//! end to end; nothing per-connection is shared across tasks. Accept
//! failures never exit the process: transient ones are logged and the loop
//! keeps serving, a fatal listener error stops accepting but drains the
//! connections that already exist.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::Handler;
use crate::http::connection::Connection;

/// Cloneable control surface for a running server.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
}

impl ServerHandle {
    /// Initiates graceful shutdown: stop accepting, finish in-flight
    /// exchanges, close.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<Config>,
    handler: Arc<dyn Handler>,
    shutdown: Arc<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
    connections: JoinSet<()>,
}

impl Server {
    /// Binds and starts listening. `SO_REUSEADDR` is set before the bind;
    /// bind and listen failures are reported separately.
    pub async fn bind(config: Config, handler: Arc<dyn Handler>) -> Result<Self, ServerError> {
        let addr_str = config.listen_addr();
        let addr: SocketAddr = addr_str.parse().map_err(|e| ServerError::Bind {
            addr: addr_str.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|e| ServerError::Bind {
            addr: addr_str.clone(),
            source: e,
        })?;
        socket.set_reuseaddr(true).map_err(|e| ServerError::Bind {
            addr: addr_str.clone(),
            source: e,
        })?;
        socket.bind(addr).map_err(|e| ServerError::Bind {
            addr: addr_str.clone(),
            source: e,
        })?;

        let listener = socket
            .listen(config.backlog)
            .map_err(|e| ServerError::Listen {
                addr: addr_str.clone(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::Listen {
            addr: addr_str.clone(),
            source: e,
        })?;

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
            handler,
            shutdown: Arc::new(shutdown),
            running: Arc::new(AtomicBool::new(true)),
            connections: JoinSet::new(),
        })
    }

    /// The bound address, useful when the configured port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: Arc::clone(&self.shutdown),
            running: Arc::clone(&self.running),
        }
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Serves until shutdown is requested, then drains the remaining
    /// connections before returning.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Listening on {}", self.local_addr);
        let mut shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                res = self.listener.accept() => match res {
                    Ok((socket, peer)) => self.spawn_connection(socket, peer),
                    Err(e) if transient_accept_error(&e) => {
                        warn!(error = %e, "accept failed, continuing");
                    }
                    Err(e) => {
                        error!(error = %e, "fatal listener error, draining connections");
                        break;
                    }
                },
                _ = shutdown.wait_for(|&stop| stop) => {
                    info!("Shutdown requested, draining connections");
                    break;
                }
                Some(res) = self.connections.join_next(), if !self.connections.is_empty() => {
                    reap(res);
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
        while let Some(res) = self.connections.join_next().await {
            reap(res);
        }
        info!("Shutdown complete");
        Ok(())
    }

    /// One cooperative tick for poll-driven embeddings: accepts whatever
    /// arrives within the window and reaps finished connection tasks.
    /// Returns the number of connections accepted.
    pub async fn poll(&mut self, timeout_ms: u64) -> Result<usize, ServerError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut accepted = 0;

        loop {
            while let Some(res) = self.connections.try_join_next() {
                reap(res);
            }
            if *self.shutdown.borrow() || Instant::now() >= deadline {
                break;
            }
            match timeout_at(deadline, self.listener.accept()).await {
                Err(_) => break,
                Ok(Ok((socket, peer))) => {
                    self.spawn_connection(socket, peer);
                    accepted += 1;
                }
                Ok(Err(e)) if transient_accept_error(&e) => {
                    warn!(error = %e, "accept failed, continuing");
                }
                Ok(Err(e)) => return Err(ServerError::Accept(e)),
            }
        }

        Ok(accepted)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }

    fn spawn_connection(&mut self, socket: TcpStream, peer: SocketAddr) {
        info!("Accepted connection from {}", peer);
        let config = Arc::clone(&self.config);
        let handler = Arc::clone(&self.handler);
        let shutdown = self.shutdown.subscribe();

        self.connections.spawn(async move {
            let mut conn = Connection::new(socket, peer, &config, handler, shutdown);
            if let Err(e) = conn.run().await {
                warn!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}

fn transient_accept_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
    )
}

fn reap(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        if e.is_panic() {
            error!(error = %e, "connection task panicked");
        }
    }
}

/// Binds and serves in one call, the common embedding.
pub async fn run(config: Config, handler: Arc<dyn Handler>) -> Result<(), ServerError> {
    Server::bind(config, handler).await?.run().await
}
