//! TCP Client
//!
//! Sends fetch requests over one connection and collects the responses.
//! Responses arrive in request order, so pipelined fetches are matched up
//! positionally.

use std::collections::VecDeque;
use std::net::{TcpStream, ToSocketAddrs};

use super::{Session, SessionState};
use crate::config::Config;
use crate::error::{ChunkError, Result};
use crate::protocol::{FetchRequest, FetchResponse, Message};
use crate::router::MessageHandler;

/// Most fetch requests `fetch_many` keeps outstanding on the wire
pub const MAX_IN_FLIGHT: usize = 64;

/// Client-side handler: queues every response for the caller
#[derive(Debug, Default)]
pub struct ClientHandler {
    received: VecDeque<FetchResponse>,
}

impl ClientHandler {
    pub fn pop(&mut self) -> Option<FetchResponse> {
        self.received.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.received.len()
    }
}

impl MessageHandler for ClientHandler {
    fn on_fetch_response(&mut self, response: FetchResponse) -> Result<()> {
        tracing::debug!(
            "Received {} bytes for chunk {:?}",
            response.data().len(),
            response.chunk_id()
        );
        self.received.push_back(response);
        Ok(())
    }
}

/// Blocking fetch client over a single TCP connection
pub struct Client {
    session: Session<TcpStream, ClientHandler>,
}

impl Client {
    /// Connect to a chunk server
    pub fn connect(addr: impl ToSocketAddrs, config: &Config) -> Result<Self> {
        config.validate()?;

        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let mut session = Session::new(stream, ClientHandler::default(), config)?;
        session.activate()?;

        Ok(Self { session })
    }

    /// Send a fetch request without waiting for the response
    pub fn send_fetch_request(&mut self, chunk_id: &str) -> Result<()> {
        self.session
            .send(&Message::FetchRequest(FetchRequest::new(chunk_id)))
    }

    /// Block until the next response arrives
    pub fn recv_response(&mut self) -> Result<FetchResponse> {
        loop {
            if let Some(response) = self.session.handler_mut().pop() {
                return Ok(response);
            }

            if self.session.read_once()? == 0 {
                self.session.close()?;
                return Err(ChunkError::ConnectionClosed);
            }
        }
    }

    /// Fetch one chunk
    pub fn fetch(&mut self, chunk_id: &str) -> Result<FetchResponse> {
        self.send_fetch_request(chunk_id)?;
        self.expect_response(chunk_id)
    }

    /// Fetch several chunks, pipelining up to [`MAX_IN_FLIGHT`] requests
    ///
    /// Responses are read before the window is refilled, so neither side
    /// can fill its socket buffers while the other is stuck writing.
    pub fn fetch_many<I, S>(&mut self, chunk_ids: I) -> Result<Vec<FetchResponse>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chunk_ids: Vec<S> = chunk_ids.into_iter().collect();
        let mut responses = Vec::with_capacity(chunk_ids.len());
        let mut sent = 0;

        while responses.len() < chunk_ids.len() {
            while sent < chunk_ids.len() && sent - responses.len() < MAX_IN_FLIGHT {
                self.send_fetch_request(chunk_ids[sent].as_ref())?;
                sent += 1;
            }

            let awaited = chunk_ids[responses.len()].as_ref();
            responses.push(self.expect_response(awaited)?);
        }

        Ok(responses)
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Receive the next response and check it answers `chunk_id`
    fn expect_response(&mut self, chunk_id: &str) -> Result<FetchResponse> {
        let response = self.recv_response()?;
        if response.chunk_id() != chunk_id {
            // Responses are out of step with requests; nothing after this
            // can be trusted
            if let Err(e) = self.session.close() {
                tracing::debug!("Error closing desynced connection: {}", e);
            }
            return Err(ChunkError::UnexpectedResponse {
                expected: chunk_id.to_string(),
                actual: response.chunk_id().to_string(),
            });
        }
        Ok(response)
    }
}
