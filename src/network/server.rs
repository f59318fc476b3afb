//! TCP Server
//!
//! Accepts connections and gives each its own thread and session.
//!
//! Connection threads report their outcome to the acceptor over a channel;
//! the acceptor logs it and frees the connection slot.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use super::Session;
use crate::config::Config;
use crate::error::{ChunkError, Result};
use crate::protocol::{FetchRequest, FetchResponse, Message};
use crate::router::MessageHandler;
use crate::source::ChunkSource;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Server-side handler: answers every fetch request from a [`ChunkSource`]
pub struct ServerHandler {
    source: Arc<dyn ChunkSource>,
}

impl ServerHandler {
    pub fn new(source: Arc<dyn ChunkSource>) -> Self {
        Self { source }
    }
}

impl MessageHandler for ServerHandler {
    fn on_fetch_request(&mut self, request: FetchRequest) -> Result<Option<Message>> {
        tracing::debug!("Fetch request for chunk {:?}", request.chunk_id());

        let data = self.source.fetch(request.chunk_id());
        let response = FetchResponse::new(request.into_chunk_id(), data);
        Ok(Some(response.into()))
    }
}

/// Outcome of one finished connection
#[derive(Debug)]
struct ConnectionReport {
    peer: String,

    /// Messages dispatched before the connection ended
    dispatched: u64,

    outcome: Result<()>,
}

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for chunk fetches
pub struct Server {
    config: Config,
    source: Arc<dyn ChunkSource>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Validate the config and bind the listen address
    pub fn bind(config: Config, source: Arc<dyn ChunkSource>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            ChunkError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;

        // Non-blocking accept lets the loop notice shutdown requests
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            source,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the accept loop to stop
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Run the accept loop until shutdown is requested (blocking)
    ///
    /// Connections still open at shutdown keep running on their own threads
    /// until their peers disconnect.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let (report_tx, report_rx) = channel::unbounded();
        let mut active = 0usize;

        while !self.shutdown.is_shutdown() {
            active -= drain_reports(&report_rx);

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if active >= self.config.max_connections {
                        tracing::warn!(
                            "Rejecting {}: {} connections already open",
                            addr,
                            active
                        );
                        drop(stream);
                        continue;
                    }

                    match self.spawn_connection(stream, addr, report_tx.clone()) {
                        Ok(()) => active += 1,
                        Err(e) => tracing::warn!("Failed to start connection {}: {}", addr, e),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    // e.g. out of file descriptors; keep serving existing peers
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        active -= drain_reports(&report_rx);
        tracing::info!("Server stopped ({} connections still open)", active);
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        reports: Sender<ConnectionReport>,
    ) -> Result<()> {
        let source = Arc::clone(&self.source);
        let config = self.config.clone();

        thread::Builder::new()
            .name(format!("chunkfetch-conn-{}", addr))
            .spawn(move || {
                let mut dispatched = 0;
                let outcome = serve_connection(stream, source, &config, &mut dispatched);
                let _ = reports.send(ConnectionReport {
                    peer: addr.to_string(),
                    dispatched,
                    outcome,
                });
            })?;

        Ok(())
    }
}

/// Drive one accepted connection to completion
fn serve_connection(
    stream: TcpStream,
    source: Arc<dyn ChunkSource>,
    config: &Config,
    dispatched: &mut u64,
) -> Result<()> {
    // Accepted sockets inherit non-blocking mode on some platforms
    stream.set_nonblocking(false)?;
    // Disable Nagle's algorithm for low latency
    stream.set_nodelay(true)?;

    let mut session = Session::new(stream, ServerHandler::new(source), config)?;
    session.activate()?;

    let outcome = session.run();
    *dispatched = session.dispatched();
    outcome
}

/// Log finished connections, returning how many slots were freed
fn drain_reports(reports: &Receiver<ConnectionReport>) -> usize {
    let mut freed = 0;
    for report in reports.try_iter() {
        freed += 1;
        match &report.outcome {
            Ok(()) => tracing::debug!(
                "Connection {} finished after {} messages",
                report.peer,
                report.dispatched
            ),
            Err(e) => tracing::warn!(
                "Connection {} failed after {} messages: {}",
                report.peer,
                report.dispatched,
                e
            ),
        }
    }
    freed
}
