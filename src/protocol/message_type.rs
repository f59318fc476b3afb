//! Message type tags
//!
//! The closed set of frame type tags. Anything else on the wire is a
//! protocol violation.

use crate::error::ChunkError;

/// Frame type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    FetchRequest = 0x01,
    FetchResponse = 0x02,
}

impl MessageType {
    /// Wire value of this tag
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::FetchRequest => "FetchRequest",
            MessageType::FetchResponse => "FetchResponse",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ChunkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageType::FetchRequest),
            0x02 => Ok(MessageType::FetchResponse),
            other => Err(ChunkError::UnknownMessageType(other)),
        }
    }
}
