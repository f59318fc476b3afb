//! Configuration for chunkfetch
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{ChunkError, Result};
use crate::protocol::MAX_PAYLOAD_SIZE;

/// Main configuration shared by the server and client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address (server) or default target address (client)
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Idle read timeout (milliseconds), 0 disables it
    ///
    /// A session that sees no bytes for this long is errored and closed.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds), 0 disables it
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Framing Configuration
    // -------------------------------------------------------------------------
    /// Largest accepted frame payload (in bytes)
    pub max_frame_size: u32,

    /// Size of the scratch buffer used for each transport read
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            max_frame_size: 16 * 1024 * 1024, // 16 MB
            read_buffer_size: 8 * 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ChunkError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(ChunkError::Config(
                "read_buffer_size must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(ChunkError::Config(
                "max_frame_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Idle read timeout, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Write timeout, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the idle read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted frame payload (in bytes)
    ///
    /// Values above the protocol ceiling are clamped to it.
    pub fn max_frame_size(mut self, bytes: u32) -> Self {
        self.config.max_frame_size = bytes.min(MAX_PAYLOAD_SIZE);
        self
    }

    /// Set the per-read scratch buffer size (in bytes)
    pub fn read_buffer_size(mut self, bytes: usize) -> Self {
        self.config.read_buffer_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
