//! Message definitions
//!
//! The typed messages a frame payload can decode into.

use super::{FetchRequest, FetchResponse, Frame, MessageType};
use crate::error::Result;

/// A decoded application message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Ask for a chunk by id
    FetchRequest(FetchRequest),

    /// Deliver a chunk's data
    FetchResponse(FetchResponse),
}

impl Message {
    /// Get the message type tag
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::FetchRequest(_) => MessageType::FetchRequest,
            Message::FetchResponse(_) => MessageType::FetchResponse,
        }
    }

    /// Serialize the payload and wrap it in a frame
    pub fn to_frame(&self) -> Result<Frame> {
        let payload = match self {
            Message::FetchRequest(request) => request.to_payload(),
            Message::FetchResponse(response) => response.to_payload()?,
        };
        Ok(Frame::new(self.message_type(), payload))
    }

    /// Deserialize a frame's payload according to its type tag
    pub fn from_frame(frame: Frame) -> Result<Self> {
        match frame.message_type() {
            MessageType::FetchRequest => {
                FetchRequest::from_payload(frame.payload()).map(Message::FetchRequest)
            }
            MessageType::FetchResponse => {
                FetchResponse::from_payload(frame.into_payload()).map(Message::FetchResponse)
            }
        }
    }
}

impl From<FetchRequest> for Message {
    fn from(request: FetchRequest) -> Self {
        Message::FetchRequest(request)
    }
}

impl From<FetchResponse> for Message {
    fn from(response: FetchResponse) -> Self {
        Message::FetchResponse(response)
    }
}
