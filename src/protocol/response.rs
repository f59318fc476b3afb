//! Fetch response
//!
//! Carries two variable-length fields, so unlike the request the payload is
//! sub-framed:
//!
//! ```text
//! ┌────────────┬───────────┬──────────────┬─────────────┐
//! │ IdLen (4)  │ Id        │ DataLen (4)  │ Data        │
//! └────────────┴───────────┴──────────────┴─────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::MessageType;
use crate::error::{ChunkError, Result};

/// Size of each inner length field
const LEN_SIZE: usize = 4;

/// Returns a chunk's data, echoing the id it was requested under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchResponse {
    chunk_id: String,
    data: Bytes,
}

impl FetchResponse {
    pub const MESSAGE_TYPE: MessageType = MessageType::FetchResponse;

    pub fn new(chunk_id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            data: data.into(),
        }
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_parts(self) -> (String, Bytes) {
        (self.chunk_id, self.data)
    }

    /// Serialize to a frame payload
    pub fn to_payload(&self) -> Result<Bytes> {
        let id = self.chunk_id.as_bytes();
        let id_len = field_len("chunk id", id.len())?;
        let data_len = field_len("data", self.data.len())?;

        let mut payload = BytesMut::with_capacity(2 * LEN_SIZE + id.len() + self.data.len());
        payload.put_u32(id_len);
        payload.put_slice(id);
        payload.put_u32(data_len);
        payload.put_slice(&self.data);

        Ok(payload.freeze())
    }

    /// Deserialize from a frame payload
    ///
    /// `data` shares the payload's allocation.
    pub fn from_payload(mut payload: Bytes) -> Result<Self> {
        let id_bytes = take_field(&mut payload, "chunk id")?;
        let chunk_id = String::from_utf8(id_bytes.to_vec()).map_err(|e| {
            ChunkError::MalformedPayload(format!("FetchResponse: chunk id is not UTF-8: {}", e))
        })?;

        let data = take_field(&mut payload, "data")?;

        if payload.has_remaining() {
            return Err(ChunkError::MalformedPayload(format!(
                "FetchResponse: {} trailing bytes after data",
                payload.remaining()
            )));
        }

        Ok(Self { chunk_id, data })
    }
}

/// Read a u32 length prefix and split off that many bytes
fn take_field(payload: &mut Bytes, field: &str) -> Result<Bytes> {
    if payload.remaining() < LEN_SIZE {
        return Err(ChunkError::MalformedPayload(format!(
            "FetchResponse: missing {} length (expected {} bytes, got {})",
            field,
            LEN_SIZE,
            payload.remaining()
        )));
    }

    let len = payload.get_u32() as usize;
    if payload.remaining() < len {
        return Err(ChunkError::MalformedPayload(format!(
            "FetchResponse: {} length {} exceeds remaining {} bytes",
            field,
            len,
            payload.remaining()
        )));
    }

    Ok(payload.split_to(len))
}

fn field_len(field: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        ChunkError::MalformedPayload(format!(
            "FetchResponse: {} of {} bytes does not fit a u32 length",
            field, len
        ))
    })
}
