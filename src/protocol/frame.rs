//! Frame encoding and single-frame decoding
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │       Payload (Len)         │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! `Len` is big-endian and unsigned. This is the only place that knows the
//! header layout.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::MessageType;
use crate::error::{ChunkError, Result};

/// Header size: 1 byte type + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Hard ceiling on a payload length (largest non-negative i32)
///
/// Any length with the high bit set is rejected regardless of configuration,
/// so peers that treat the field as signed never see a negative length.
pub const MAX_PAYLOAD_SIZE: u32 = i32::MAX as u32;

/// One type-tagged, length-delimited unit on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    message_type: MessageType,
    payload: Bytes,
}

impl Frame {
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Total encoded size including the header
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append the encoded frame to `dst`
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        let len = payload_len(&self.payload)?;
        dst.reserve(HEADER_SIZE + self.payload.len());
        dst.put_u8(self.message_type.as_u8());
        dst.put_u32(len);
        dst.put_slice(&self.payload);
        Ok(())
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Encode a frame to bytes
///
/// Format: type (1) + payload_len (4) + payload
pub fn encode_frame(message_type: MessageType, payload: &[u8]) -> Result<Vec<u8>> {
    let len = payload_len(payload)?;

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(message_type.as_u8());
    message.extend_from_slice(&len.to_be_bytes());
    message.extend_from_slice(payload);

    Ok(message)
}

/// Try to take one frame off the front of `buffer`
///
/// Returns `Ok(None)` when more bytes are needed. Neither `Ok(None)` nor an
/// error consume anything, so the same buffer can be retried once extended.
/// On success exactly `HEADER_SIZE + len` bytes are consumed.
pub fn decode_frame(buffer: &mut BytesMut, max_payload: u32) -> Result<Option<Frame>> {
    if buffer.len() < HEADER_SIZE {
        return Ok(None);
    }

    // Peek the header without advancing
    let message_type = MessageType::try_from(buffer[0])?;
    let len = u32::from_be_bytes([buffer[1], buffer[2], buffer[3], buffer[4]]);

    let limit = max_payload.min(MAX_PAYLOAD_SIZE);
    if len > limit {
        return Err(ChunkError::MalformedFrame(format!(
            "payload length {} exceeds limit {}",
            len, limit
        )));
    }

    let len = len as usize;
    if buffer.len() - HEADER_SIZE < len {
        return Ok(None);
    }

    buffer.advance(HEADER_SIZE);
    let payload = buffer.split_to(len).freeze();

    Ok(Some(Frame {
        message_type,
        payload,
    }))
}

fn payload_len(payload: &[u8]) -> Result<u32> {
    u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_SIZE)
        .ok_or_else(|| {
            ChunkError::MalformedFrame(format!(
                "payload of {} bytes does not fit in a frame",
                payload.len()
            ))
        })
}
