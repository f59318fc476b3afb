//! Error types for chunkfetch
//!
//! Provides a unified error type for all operations.
//!
//! Every variant is scoped to a single connection: the owning session closes
//! and reports it, other connections are unaffected.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using ChunkError
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Unified error type for chunkfetch operations
#[derive(Debug, Error)]
pub enum ChunkError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Idle read timeout after {0:?}")]
    IdleTimeout(Duration),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    // -------------------------------------------------------------------------
    // Payload Errors
    // -------------------------------------------------------------------------
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Invalid session state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unexpected response: waiting for chunk {expected:?}, got {actual:?}")]
    UnexpectedResponse { expected: String, actual: String },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChunkError {
    /// Whether this error must terminate the connection it occurred on.
    ///
    /// Framing corruption cannot be recovered mid-stream, so everything that
    /// comes out of the read/decode/dispatch cycle is fatal. Only caller
    /// mistakes (wrong state, bad config) leave the connection usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ChunkError::InvalidState { .. } | ChunkError::Config(_))
    }
}
