//! Tests for the accumulation buffer / decode loop
//!
//! These tests verify:
//! - Fragmentation independence (any split, including single bytes)
//! - Multiple frames packed into one delivery
//! - Partial tail preserved across deliveries
//! - Decoding stops for good after a protocol violation

use chunkfetch::protocol::{encode_frame, Frame, FrameDecoder, MessageType};
use chunkfetch::ChunkError;

const LIMIT: u32 = 1024 * 1024;

// =============================================================================
// Helper Functions
// =============================================================================

fn request_frame(id: &str) -> Vec<u8> {
    encode_frame(MessageType::FetchRequest, id.as_bytes()).unwrap()
}

/// Push `data` and return only the frames it completed
fn feed(decoder: &mut FrameDecoder, data: &[u8]) -> Vec<Frame> {
    let mut frames = Vec::new();
    decoder.push(data, &mut frames).unwrap();
    frames
}

fn decode_all(data: &[u8]) -> Vec<Frame> {
    feed(&mut FrameDecoder::new(LIMIT), data)
}

fn sample_frame() -> Vec<u8> {
    // Payload long enough to span several splits
    encode_frame(MessageType::FetchResponse, b"\x00\x00\x00\x03abc\x00\x00\x00\x02xy").unwrap()
}

// =============================================================================
// Fragmentation Tests
// =============================================================================

#[test]
fn test_single_byte_deliveries() {
    let bytes = sample_frame();
    let mut decoder = FrameDecoder::new(LIMIT);
    let mut frames = Vec::new();

    for byte in &bytes {
        decoder
            .push(std::slice::from_ref(byte), &mut frames)
            .unwrap();
    }

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].message_type(), MessageType::FetchResponse);
    assert_eq!(frames[0].payload().len(), bytes.len() - 5);
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn test_every_two_way_split_matches_whole_decode() {
    let bytes = sample_frame();
    let whole = decode_all(&bytes);
    assert_eq!(whole.len(), 1);

    for split in 0..=bytes.len() {
        let mut decoder = FrameDecoder::new(LIMIT);
        let mut frames = feed(&mut decoder, &bytes[..split]);
        frames.extend(feed(&mut decoder, &bytes[split..]));

        assert_eq!(frames, whole, "split at {}", split);
    }
}

#[test]
fn test_uneven_chunked_deliveries() {
    let bytes = sample_frame();
    let whole = decode_all(&bytes);

    for chunk_size in 1..bytes.len() {
        let mut decoder = FrameDecoder::new(LIMIT);
        let mut frames = Vec::new();
        for piece in bytes.chunks(chunk_size) {
            frames.extend(feed(&mut decoder, piece));
        }
        assert_eq!(frames, whole, "chunk size {}", chunk_size);
    }
}

#[test]
fn test_empty_delivery_yields_nothing() {
    let mut decoder = FrameDecoder::new(LIMIT);
    assert!(feed(&mut decoder, &[]).is_empty());
    assert_eq!(decoder.buffered_len(), 0);
}

// =============================================================================
// Packing Tests
// =============================================================================

#[test]
fn test_multiple_frames_in_one_delivery() {
    let ids = ["chunk1", "chunk2", "", "chunk42"];
    let bytes: Vec<u8> = ids.iter().flat_map(|id| request_frame(id)).collect();

    let frames = decode_all(&bytes);

    assert_eq!(frames.len(), ids.len());
    for (frame, id) in frames.iter().zip(ids) {
        assert_eq!(frame.payload().as_ref(), id.as_bytes());
    }
}

#[test]
fn test_partial_tail_preserved() {
    let first = request_frame("complete");
    let second = request_frame("truncated");
    let cut = 7;

    let mut delivery = first.clone();
    delivery.extend_from_slice(&second[..cut]);

    let mut decoder = FrameDecoder::new(LIMIT);
    let frames = feed(&mut decoder, &delivery);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload().as_ref(), b"complete");
    assert_eq!(decoder.buffered(), &second[..cut]);

    let frames = feed(&mut decoder, &second[cut..]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload().as_ref(), b"truncated");
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn test_frames_iterator_is_lazy() {
    let mut bytes = request_frame("a");
    bytes.extend(request_frame("b"));

    let mut decoder = FrameDecoder::new(LIMIT);
    decoder.extend(&bytes);

    let first = decoder.frames().next().unwrap().unwrap();
    assert_eq!(first.payload().as_ref(), b"a");
    // Second frame still buffered until asked for
    assert_eq!(decoder.buffered_len(), 5 + 1);

    let rest: Vec<_> = decoder.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(rest.len(), 1);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_type_stops_decoding() {
    let mut bytes = request_frame("ok");
    bytes.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend(request_frame("never"));

    let mut decoder = FrameDecoder::new(LIMIT);
    decoder.extend(&bytes);

    let results: Vec<_> = decoder.frames().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ChunkError::UnknownMessageType(3))));

    // Nothing else is ever produced
    assert!(decoder.is_failed());
    assert_eq!(decoder.buffered_len(), 0);
    assert!(feed(&mut decoder, &request_frame("later")).is_empty());
}

#[test]
fn test_push_keeps_frames_before_violation() {
    let mut bytes = request_frame("first");
    bytes.extend(request_frame("second"));
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend(request_frame("never"));

    let mut frames = Vec::new();
    let err = FrameDecoder::new(LIMIT)
        .push(&bytes, &mut frames)
        .unwrap_err();

    assert!(matches!(err, ChunkError::UnknownMessageType(0)));
    let payloads: Vec<&[u8]> = frames.iter().map(|f| f.payload().as_ref()).collect();
    assert_eq!(payloads, vec![&b"first"[..], &b"second"[..]]);
}

#[test]
fn test_push_appends_and_counts() {
    let mut decoder = FrameDecoder::new(LIMIT);
    let mut frames = vec![];

    assert_eq!(decoder.push(&request_frame("a"), &mut frames).unwrap(), 1);
    let mut packed = request_frame("b");
    packed.extend(request_frame("c"));
    assert_eq!(decoder.push(&packed, &mut frames).unwrap(), 2);

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2].payload().as_ref(), b"c");
}

#[test]
fn test_oversized_frame_rejected_before_payload_arrives() {
    let mut decoder = FrameDecoder::new(16);
    let err = decoder
        .push(&[0x01, 0x00, 0x00, 0x00, 0x11], &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, ChunkError::MalformedFrame(_)));
}
