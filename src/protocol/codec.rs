//! Protocol codec
//!
//! Message-level encoding and decoding on top of the frame layer.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Message Type
//! - 0x01 FetchRequest:  chunk_id (raw, length implied by Len)
//! - 0x02 FetchResponse: id_len (4) + chunk_id + data_len (4) + data

use std::io::{Read, Write};

use bytes::BytesMut;

use super::frame::{decode_frame, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use super::{Message, MessageType};
use crate::error::{ChunkError, Result};

// =============================================================================
// Message Encoding/Decoding
// =============================================================================

/// Encode a message to frame bytes
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    let frame = message.to_frame()?;
    let mut bytes = BytesMut::with_capacity(frame.encoded_len());
    frame.encode_into(&mut bytes)?;
    Ok(bytes.to_vec())
}

/// Decode a message from exactly one complete frame
///
/// Unlike the streaming decoder, an incomplete frame or trailing bytes are
/// errors here.
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    let mut buffer = BytesMut::from(bytes);

    let frame = decode_frame(&mut buffer, MAX_PAYLOAD_SIZE)?.ok_or_else(|| {
        ChunkError::MalformedFrame(format!("incomplete frame: got {} bytes", bytes.len()))
    })?;

    if !buffer.is_empty() {
        return Err(ChunkError::MalformedFrame(format!(
            "{} trailing bytes after frame",
            buffer.len()
        )));
    }

    Message::from_frame(frame)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a message to a stream and flush it
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<()> {
    let bytes = encode_message(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one complete message from a blocking stream
///
/// Blocks until a complete frame is received or an error occurs. Sessions
/// use the accumulation buffer instead; this is for simple request/response
/// tooling over a dedicated stream.
pub fn read_message<R: Read>(reader: &mut R, max_payload: u32) -> Result<Message> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let message_type = MessageType::try_from(header[0])?;
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

    let limit = max_payload.min(MAX_PAYLOAD_SIZE);
    if payload_len > limit {
        return Err(ChunkError::MalformedFrame(format!(
            "payload length {} exceeds limit {}",
            payload_len, limit
        )));
    }

    let mut payload = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload)?;

    Message::from_frame(super::Frame::new(message_type, payload))
}
