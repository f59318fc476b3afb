//! Message Router
//!
//! Turns a decoded frame into a typed message and hands it to the handler
//! for the local role. Dispatch is synchronous: a message is fully handled
//! before the caller decodes the next frame.
//!
//! ```text
//!   Frame ──► Message::from_frame ──► MessageHandler::on_fetch_*
//!                                           │
//!                                           ▼
//!                                   Option<Message> reply
//! ```

use crate::error::Result;
use crate::protocol::{FetchRequest, FetchResponse, Frame, Message, MessageType};

/// Application callbacks for one side of a connection
///
/// The server overrides `on_fetch_request`, the client overrides
/// `on_fetch_response`. A message without an override is logged and
/// dropped.
pub trait MessageHandler {
    /// Handle a fetch request, optionally returning a reply to send back
    fn on_fetch_request(&mut self, request: FetchRequest) -> Result<Option<Message>> {
        unhandled(MessageType::FetchRequest, request.chunk_id());
        Ok(None)
    }

    /// Handle a fetch response
    fn on_fetch_response(&mut self, response: FetchResponse) -> Result<()> {
        unhandled(MessageType::FetchResponse, response.chunk_id());
        Ok(())
    }
}

fn unhandled(message_type: MessageType, chunk_id: &str) {
    tracing::warn!(
        "No handler for {} (chunk {:?}) on this connection, dropping",
        message_type.name(),
        chunk_id
    );
}

/// Routes frames to a [`MessageHandler`]
pub struct Router<H> {
    handler: H,

    /// Messages dispatched so far
    dispatched: u64,
}

impl<H: MessageHandler> Router<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            dispatched: 0,
        }
    }

    /// Deserialize a frame and invoke the matching handler
    ///
    /// Returns the reply the handler produced, if any.
    pub fn dispatch(&mut self, frame: Frame) -> Result<Option<Message>> {
        let message = Message::from_frame(frame)?;
        self.dispatched += 1;

        tracing::trace!("Dispatching {:?}", message);

        match message {
            Message::FetchRequest(request) => self.handler.on_fetch_request(request),
            Message::FetchResponse(response) => {
                self.handler.on_fetch_response(response)?;
                Ok(None)
            }
        }
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}
