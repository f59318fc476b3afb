//! Protocol Module
//!
//! Defines the wire protocol between a fetch client and a chunk server.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Message Types
//! - 0x01: FetchRequest  - Payload: chunk_id
//! - 0x02: FetchResponse - Payload: id_len (4) + chunk_id + data_len (4) + data
//!
//! Any other type byte is fatal to the connection.

mod message_type;
mod frame;
mod decoder;
mod request;
mod response;
mod message;
mod codec;

pub use message_type::MessageType;
pub use frame::{Frame, encode_frame, decode_frame, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use decoder::{FrameDecoder, Frames};
pub use request::FetchRequest;
pub use response::FetchResponse;
pub use message::Message;
pub use codec::{encode_message, decode_message, write_message, read_message};
