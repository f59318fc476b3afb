//! Chunk Sources
//!
//! Server-side lookup collaborator: given a chunk id, produce its bytes.

use bytes::Bytes;

/// Looks up (or synthesizes) the data for a chunk id
///
/// Shared by every connection thread of a server.
pub trait ChunkSource: Send + Sync {
    fn fetch(&self, chunk_id: &str) -> Bytes;
}

impl<F> ChunkSource for F
where
    F: Fn(&str) -> Bytes + Send + Sync,
{
    fn fetch(&self, chunk_id: &str) -> Bytes {
        self(chunk_id)
    }
}

/// Synthesizes `"data for chunk <id>"` for any id
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl ChunkSource for SyntheticSource {
    fn fetch(&self, chunk_id: &str) -> Bytes {
        Bytes::from(format!("data for chunk {}", chunk_id))
    }
}
