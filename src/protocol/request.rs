//! Fetch request
//!
//! Payload is the raw chunk id bytes. There is no inner length prefix: the
//! enclosing frame length already says how long the id is.

use bytes::Bytes;

use super::MessageType;
use crate::error::{ChunkError, Result};

/// Asks the peer for one named chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    chunk_id: String,
}

impl FetchRequest {
    pub const MESSAGE_TYPE: MessageType = MessageType::FetchRequest;

    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
        }
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn into_chunk_id(self) -> String {
        self.chunk_id
    }

    /// Serialize to a frame payload
    pub fn to_payload(&self) -> Bytes {
        Bytes::copy_from_slice(self.chunk_id.as_bytes())
    }

    /// Deserialize from a frame payload
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let chunk_id = std::str::from_utf8(payload).map_err(|e| {
            ChunkError::MalformedPayload(format!("FetchRequest: chunk id is not UTF-8: {}", e))
        })?;

        Ok(Self::new(chunk_id))
    }
}
