//! Accumulation buffer and decode loop
//!
//! Bytes arrive from the transport in arbitrary pieces. [`FrameDecoder`]
//! appends them to a single `BytesMut` and hands out complete frames one at
//! a time, leaving any partial tail in place for the next read.
//!
//! # Example
//!
//! ```
//! use chunkfetch::protocol::{encode_frame, FrameDecoder, MessageType};
//!
//! let bytes = encode_frame(MessageType::FetchRequest, b"chunk1").unwrap();
//! let mut decoder = FrameDecoder::new(1024);
//!
//! let mut frames = Vec::new();
//!
//! // First half: nothing complete yet
//! assert_eq!(decoder.push(&bytes[..4], &mut frames).unwrap(), 0);
//!
//! // Second half completes the frame
//! assert_eq!(decoder.push(&bytes[4..], &mut frames).unwrap(), 1);
//! assert_eq!(frames[0].payload().as_ref(), b"chunk1");
//! ```

use bytes::BytesMut;

use super::frame::{decode_frame, Frame};
use crate::error::Result;

/// Initial buffer capacity (8 KB)
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Per-connection accumulation buffer plus decode state
///
/// Owned by exactly one session. After a decode error the buffer is
/// discarded and the decoder yields nothing further.
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes read from the transport but not yet consumed into a frame
    buffer: BytesMut,

    /// Largest accepted payload length
    max_payload: u32,

    /// Set once a decode error has been returned
    failed: bool,
}

impl FrameDecoder {
    pub fn new(max_payload: u32) -> Self {
        Self::with_capacity(INITIAL_CAPACITY, max_payload)
    }

    pub fn with_capacity(capacity: usize, max_payload: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            max_payload,
            failed: false,
        }
    }

    /// Append freshly read bytes
    ///
    /// Ignored once the decoder has failed.
    pub fn extend(&mut self, data: &[u8]) {
        if !self.failed {
            self.buffer.extend_from_slice(data);
        }
    }

    /// Extract the next complete frame, if any
    ///
    /// - `Ok(Some(frame))`: a frame was consumed from the front
    /// - `Ok(None)`: need more data (or the decoder has failed)
    /// - `Err(..)`: protocol violation; the buffer is discarded
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.failed {
            return Ok(None);
        }

        match decode_frame(&mut self.buffer, self.max_payload) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.failed = true;
                self.buffer.clear();
                Err(e)
            }
        }
    }

    /// Lazily iterate the complete frames currently buffered
    ///
    /// The iterator ends at the first `NeedMoreData` or right after the
    /// first error.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            decoder: self,
            done: false,
        }
    }

    /// Append `data` and move every frame it completes into `frames`
    ///
    /// Returns how many frames were added. On a protocol violation the
    /// frames that preceded it stay in `frames` and the error is returned.
    pub fn push(&mut self, data: &[u8], frames: &mut Vec<Frame>) -> Result<usize> {
        self.extend(data);

        let before = frames.len();
        for frame in self.frames() {
            frames.push(frame?);
        }
        Ok(frames.len() - before)
    }

    /// Number of bytes waiting for a complete frame
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes waiting for a complete frame
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Drop any buffered bytes (connection is going away)
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Iterator returned by [`FrameDecoder::frames`]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.decoder.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Frames<'_> {}
