//! # chunkfetch
//!
//! A minimal point-to-point chunk retrieval protocol:
//! - Type-tagged, length-delimited binary framing
//! - Decoding from arbitrarily fragmented byte streams
//! - Per-connection sessions with explicit lifecycle and error reporting
//! - Blocking TCP server and client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TCP Server / TCP Client                      │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection Session                          │
//! │        (accumulation buffer, lifecycle, errors)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Frame Codec │ frames   │   Router    │
//!   │  (decode)   │─────────>│ (dispatch)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Handlers   │
//!                           │ (per role)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod router;
pub mod source;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChunkError, Result};
pub use config::Config;
pub use protocol::{FetchRequest, FetchResponse, Message};
pub use router::{MessageHandler, Router};
pub use source::{ChunkSource, SyntheticSource};
pub use network::{Client, Server, Session, SessionState};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of chunkfetch
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
