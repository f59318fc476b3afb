//! Tests for the Connection Session
//!
//! These tests verify:
//! - Lifecycle transitions (Connecting → Active → Closing → Closed)
//! - Decode-on-read with fragmented and packed deliveries
//! - Fatal errors move the session to Errored and stop processing
//! - Idle read timeout handling
//!
//! The transport is an in-memory script so every read boundary is exact.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chunkfetch::network::{ServerHandler, Transport};
use chunkfetch::protocol::{
    encode_frame, encode_message, FetchRequest, FetchResponse, FrameDecoder, Message, MessageType,
};
use chunkfetch::{
    ChunkError, Config, MessageHandler, Result, Session, SessionState, SyntheticSource,
};

// =============================================================================
// Helper Types
// =============================================================================

enum ReadEvent {
    Data(Vec<u8>),
    Error(io::ErrorKind),
}

/// Scripted transport: each read returns the next event, then EOF
#[derive(Default)]
struct ScriptedTransport {
    reads: VecDeque<ReadEvent>,
    written: Vec<u8>,
    fail_writes: bool,
    closed: usize,
}

impl ScriptedTransport {
    fn with_reads(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            reads: chunks.into_iter().map(ReadEvent::Data).collect(),
            ..Default::default()
        }
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Ok(0),
            Some(ReadEvent::Error(kind)) => Err(io::Error::new(kind, "scripted")),
            Some(ReadEvent::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(ReadEvent::Data(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn peer(&self) -> String {
        "scripted".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed += 1;
        Ok(())
    }
}

/// Client-side handler exposing the (chunk id, data) callback shape
#[derive(Default)]
struct Delivered {
    pairs: Vec<(String, Bytes)>,
}

impl MessageHandler for Delivered {
    fn on_fetch_response(&mut self, response: FetchResponse) -> Result<()> {
        self.pairs.push(response.into_parts());
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn server_session(transport: ScriptedTransport) -> Session<ScriptedTransport, ServerHandler> {
    let config = Config::builder().read_buffer_size(16).build();
    let mut session =
        Session::new(transport, ServerHandler::new(Arc::new(SyntheticSource)), &config).unwrap();
    session.activate().unwrap();
    session
}

fn request_bytes(id: &str) -> Vec<u8> {
    encode_message(&Message::from(FetchRequest::new(id))).unwrap()
}

/// Decode everything the session wrote back
fn written_messages(bytes: &[u8]) -> Vec<Message> {
    let mut frames = Vec::new();
    FrameDecoder::new(u32::MAX).push(bytes, &mut frames).unwrap();
    frames
        .into_iter()
        .map(|frame| Message::from_frame(frame).unwrap())
        .collect()
}

fn response(id: &str) -> Message {
    Message::from(FetchResponse::new(
        id,
        Bytes::from(format!("data for chunk {}", id)),
    ))
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_session_lifecycle() {
    let config = Config::default();
    let mut session =
        Session::new(ScriptedTransport::default(), Delivered::default(), &config).unwrap();
    assert_eq!(session.state(), SessionState::Connecting);

    session.activate().unwrap();
    assert_eq!(session.state(), SessionState::Active);

    session.close().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.transport().closed, 1);

    // Idempotent
    session.close().unwrap();
    assert_eq!(session.transport().closed, 1);
}

#[test]
fn test_send_requires_active() {
    let config = Config::default();
    let mut session =
        Session::new(ScriptedTransport::default(), Delivered::default(), &config).unwrap();

    let err = session
        .send(&Message::from(FetchRequest::new("chunk1")))
        .unwrap_err();
    assert!(matches!(
        err,
        ChunkError::InvalidState {
            expected: "Active",
            actual: "Connecting"
        }
    ));
    assert!(!err.is_fatal());
    assert!(session.transport().written.is_empty());
}

#[test]
fn test_activate_twice_fails() {
    let mut session = server_session(ScriptedTransport::default());
    assert!(session.activate().is_err());
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn test_send_writes_one_frame() {
    let mut session = server_session(ScriptedTransport::default());
    session
        .send(&Message::from(FetchRequest::new("chunk7")))
        .unwrap();

    assert_eq!(session.transport().written, request_bytes("chunk7"));
}

// =============================================================================
// Read / Decode / Dispatch Tests
// =============================================================================

#[test]
fn test_fragmented_request_answered_once() {
    let chunks = request_bytes("chunk7")
        .into_iter()
        .map(|b| vec![b])
        .collect();
    let mut session = server_session(ScriptedTransport::with_reads(chunks));

    session.run().unwrap();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.dispatched(), 1);
    assert_eq!(
        written_messages(&session.transport().written),
        vec![response("chunk7")]
    );
}

#[test]
fn test_packed_requests_answered_in_order() {
    let ids = ["chunk1", "chunk2", "chunk3"];
    let packed: Vec<u8> = ids.iter().flat_map(|id| request_bytes(id)).collect();
    let mut session = server_session(ScriptedTransport::with_reads(vec![packed]));

    session.run().unwrap();

    let expected: Vec<_> = ids.iter().map(|id| response(id)).collect();
    assert_eq!(written_messages(&session.transport().written), expected);
}

#[test]
fn test_partial_tail_waits_for_next_read() {
    let first = request_bytes("first");
    let second = request_bytes("second");

    let mut delivery = first.clone();
    delivery.extend_from_slice(&second[..3]);

    let mut session = server_session(ScriptedTransport::default());
    session.on_bytes(&delivery).unwrap();

    assert_eq!(session.dispatched(), 1);
    assert_eq!(session.buffered_len(), 3);

    session.on_bytes(&second[3..]).unwrap();
    assert_eq!(session.dispatched(), 2);
    assert_eq!(session.buffered_len(), 0);
}

#[test]
fn test_client_handler_receives_pair() {
    let config = Config::default();
    let mut session =
        Session::new(ScriptedTransport::default(), Delivered::default(), &config).unwrap();
    session.activate().unwrap();

    let bytes = encode_message(&response("chunk7")).unwrap();
    session.on_bytes(&bytes).unwrap();

    assert_eq!(
        session.handler().pairs,
        vec![(
            "chunk7".to_string(),
            Bytes::from_static(b"data for chunk chunk7")
        )]
    );
}

#[test]
fn test_eof_mid_frame_discards_tail() {
    let request = request_bytes("chunk7");
    let mut session = server_session(ScriptedTransport::with_reads(vec![
        request[..request.len() - 2].to_vec(),
    ]));

    session.run().unwrap();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.dispatched(), 0);
    assert_eq!(session.buffered_len(), 0);
    assert!(session.transport().written.is_empty());
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_type_errors_session() {
    // Valid request, a frame with type 3, then a request that must be ignored
    let mut delivery = request_bytes("chunk1");
    delivery.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, 0x00]);
    delivery.extend(request_bytes("chunk2"));

    let mut session = server_session(ScriptedTransport::with_reads(vec![delivery]));

    let err = session.run().unwrap_err();

    assert!(matches!(err, ChunkError::UnknownMessageType(3)));
    assert!(err.is_fatal());
    assert_eq!(session.state(), SessionState::Errored);
    assert_eq!(session.dispatched(), 1);
    assert_eq!(session.buffered_len(), 0);
    assert_eq!(session.transport().closed, 1);
    assert_eq!(
        written_messages(&session.transport().written),
        vec![response("chunk1")]
    );

    // Errored sessions refuse further work and close to Closed
    assert!(session.on_bytes(&request_bytes("chunk3")).is_err());
    session.close().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.transport().closed, 1);
}

#[test]
fn test_malformed_payload_errors_session() {
    let config = Config::default();
    let mut session =
        Session::new(ScriptedTransport::default(), Delivered::default(), &config).unwrap();
    session.activate().unwrap();

    let bytes = encode_frame(MessageType::FetchResponse, &[0, 0, 0, 9, b'x']).unwrap();
    let err = session.on_bytes(&bytes).unwrap_err();

    assert!(matches!(err, ChunkError::MalformedPayload(_)));
    assert_eq!(session.state(), SessionState::Errored);
    assert!(session.handler().pairs.is_empty());
}

#[test]
fn test_idle_timeout_errors_session() {
    let transport = ScriptedTransport {
        reads: VecDeque::from(vec![ReadEvent::Error(io::ErrorKind::WouldBlock)]),
        ..Default::default()
    };
    let config = Config::builder().read_timeout_ms(250).build();
    let mut session =
        Session::new(transport, ServerHandler::new(Arc::new(SyntheticSource)), &config).unwrap();
    session.activate().unwrap();

    let err = session.run().unwrap_err();

    assert!(matches!(err, ChunkError::IdleTimeout(d) if d == Duration::from_millis(250)));
    assert_eq!(session.state(), SessionState::Errored);
}

#[test]
fn test_interrupted_read_is_retried() {
    let transport = ScriptedTransport {
        reads: VecDeque::from(vec![
            ReadEvent::Error(io::ErrorKind::Interrupted),
            ReadEvent::Data(request_bytes("chunk9")),
        ]),
        ..Default::default()
    };
    let mut session = server_session(transport);

    session.run().unwrap();
    assert_eq!(session.dispatched(), 1);
}

#[test]
fn test_transport_error_errors_session() {
    let transport = ScriptedTransport {
        reads: VecDeque::from(vec![ReadEvent::Error(io::ErrorKind::ConnectionReset)]),
        ..Default::default()
    };
    let mut session = server_session(transport);

    let err = session.run().unwrap_err();
    assert!(matches!(err, ChunkError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
    assert_eq!(session.state(), SessionState::Errored);
}

#[test]
fn test_write_failure_errors_session() {
    let transport = ScriptedTransport {
        reads: VecDeque::from(vec![ReadEvent::Data(request_bytes("chunk1"))]),
        fail_writes: true,
        ..Default::default()
    };
    let mut session = server_session(transport);

    let err = session.run().unwrap_err();
    assert!(matches!(err, ChunkError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(session.state(), SessionState::Errored);
}
