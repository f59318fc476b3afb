//! Connection Session
//!
//! Owns one bidirectional stream together with its accumulation buffer and
//! drives read → decode → dispatch → reply.
//!
//! ## State Machine
//!
//! ```text
//! ┌────────────┐ activate ┌────────┐  close  ┌─────────┐        ┌────────┐
//! │ Connecting │─────────>│ Active │────────>│ Closing │───────>│ Closed │
//! └────────────┘          └────────┘         └─────────┘        └────────┘
//!                              │ fatal error                         ▲
//!                              ▼                                     │
//!                         ┌─────────┐            close               │
//!                         │ Errored │────────────────────────────────┘
//!                         └─────────┘
//! ```
//!
//! Entering `Errored` releases the transport and discards the buffer at
//! once; nothing further is decoded or dispatched.

use std::io::{self, Read, Write};
use std::time::Duration;

use super::Transport;
use crate::config::Config;
use crate::error::{ChunkError, Result};
use crate::protocol::{encode_message, FrameDecoder, Message};
use crate::router::{MessageHandler, Router};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport handshake/accept not yet confirmed
    Connecting,
    /// Reading, decoding, dispatching and writing
    Active,
    /// Shutdown requested, transport being released
    Closing,
    /// Transport released
    Closed,
    /// Fatal error occurred, transport already released
    Errored,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Connecting => "Connecting",
            SessionState::Active => "Active",
            SessionState::Closing => "Closing",
            SessionState::Closed => "Closed",
            SessionState::Errored => "Errored",
        }
    }
}

/// One connection's protocol state
pub struct Session<T, H> {
    /// Underlying byte stream
    transport: T,

    /// Accumulation buffer and decode state
    decoder: FrameDecoder,

    /// Frame → message → handler
    router: Router<H>,

    state: SessionState,

    /// Peer identity for logging
    peer: String,

    /// Scratch space for a single transport read
    read_buf: Vec<u8>,

    /// Idle read timeout applied to the transport
    idle_timeout: Option<Duration>,
}

impl<T: Transport, H: MessageHandler> Session<T, H> {
    /// Create a session in the `Connecting` state
    ///
    /// Applies the configured timeouts to the transport.
    pub fn new(transport: T, handler: H, config: &Config) -> Result<Self> {
        let idle_timeout = config.read_timeout();
        transport.set_timeouts(idle_timeout, config.write_timeout())?;

        Ok(Self {
            peer: transport.peer(),
            transport,
            decoder: FrameDecoder::new(config.max_frame_size),
            router: Router::new(handler),
            state: SessionState::Connecting,
            read_buf: vec![0u8; config.read_buffer_size.max(1)],
            idle_timeout,
        })
    }

    /// Transport is connected: start serving
    pub fn activate(&mut self) -> Result<()> {
        if self.state != SessionState::Connecting {
            return Err(self.invalid_state("Connecting"));
        }
        self.state = SessionState::Active;
        tracing::debug!("Session with {} active", self.peer);
        Ok(())
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Encode and write one message, flushing before returning
    ///
    /// Writes are issued in call order, so message N is fully on the wire
    /// before message N+1 starts.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.ensure_active()?;

        let bytes = encode_message(message)?;
        tracing::trace!("Sending {} bytes to {}: {:?}", bytes.len(), self.peer, message);

        let written = self
            .transport
            .write_all(&bytes)
            .and_then(|_| self.transport.flush());
        if let Err(e) = written {
            return Err(self.fail(e.into()));
        }
        Ok(())
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Feed bytes delivered by the transport and run the decode loop
    ///
    /// Every complete frame is dispatched (and any reply written) before
    /// this returns. A partial trailing frame stays buffered.
    pub fn on_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_active()?;
        self.decoder.extend(data);
        self.drain()
    }

    /// Perform one transport read and process what arrived
    ///
    /// Returns the number of bytes read; 0 means the peer closed the stream.
    pub fn read_once(&mut self) -> Result<usize> {
        self.ensure_active()?;

        let n = loop {
            match self.transport.read(&mut self.read_buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    // Unix reports an expired read timeout as WouldBlock,
                    // Windows as TimedOut
                    let timeout = self.idle_timeout.unwrap_or_default();
                    return Err(self.fail(ChunkError::IdleTimeout(timeout)));
                }
                Err(e) => return Err(self.fail(e.into())),
            }
        };

        if n == 0 {
            return Ok(0);
        }

        tracing::trace!("Read {} bytes from {}", n, self.peer);
        self.decoder.extend(&self.read_buf[..n]);
        self.drain()?;
        Ok(n)
    }

    /// Serve until the peer closes the stream or a fatal error occurs
    ///
    /// On a clean end of stream the session is closed and `Ok(())`
    /// returned. On error the session is left `Errored`.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.read_once()? == 0 {
                tracing::debug!("Peer {} closed the connection", self.peer);
                return self.close();
            }
        }
    }

    /// Decode loop: extract and dispatch frames until more data is needed
    fn drain(&mut self) -> Result<()> {
        loop {
            let frame = match self.decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(e) => return Err(self.fail(e)),
            };

            tracing::trace!(
                "Decoded {} frame ({} bytes) from {}",
                frame.message_type().name(),
                frame.payload().len(),
                self.peer
            );

            let reply = match self.router.dispatch(frame) {
                Ok(reply) => reply,
                Err(e) => return Err(self.fail(e)),
            };

            if let Some(reply) = reply {
                self.send(&reply)?;
            }
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Close the session and release the transport
    ///
    /// Any partially received frame is discarded, never delivered.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => Ok(()),
            SessionState::Errored => {
                self.state = SessionState::Closed;
                Ok(())
            }
            SessionState::Connecting | SessionState::Active | SessionState::Closing => {
                self.state = SessionState::Closing;

                let pending = self.decoder.buffered_len();
                if pending > 0 {
                    tracing::debug!(
                        "Discarding {} bytes of partial frame from {}",
                        pending,
                        self.peer
                    );
                }
                self.decoder.clear();

                let released = self.transport.close();
                self.state = SessionState::Closed;
                tracing::debug!("Session with {} closed", self.peer);

                released.map_err(ChunkError::from)
            }
        }
    }

    /// Move to `Errored`, release everything, and hand the error back
    fn fail(&mut self, error: ChunkError) -> ChunkError {
        tracing::warn!("Session with {} failed: {}", self.peer, error);

        self.state = SessionState::Errored;
        self.decoder.clear();
        if let Err(e) = self.transport.close() {
            tracing::debug!("Error releasing transport for {}: {}", self.peer, e);
        }

        error
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(self.invalid_state("Active"))
        }
    }

    fn invalid_state(&self, expected: &'static str) -> ChunkError {
        ChunkError::InvalidState {
            expected,
            actual: self.state.name(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Bytes held in the accumulation buffer
    pub fn buffered_len(&self) -> usize {
        self.decoder.buffered_len()
    }

    /// Messages dispatched to the handler so far
    pub fn dispatched(&self) -> u64 {
        self.router.dispatched()
    }

    pub fn handler(&self) -> &H {
        self.router.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.router.handler_mut()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
