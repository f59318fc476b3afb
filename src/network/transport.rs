//! Transport abstraction
//!
//! The byte-stream collaborator a session drives: read, write, close.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A reliable, ordered byte stream
pub trait Transport: Read + Write {
    /// Human-readable peer identity for logging
    fn peer(&self) -> String {
        "unknown".to_string()
    }

    /// Configure read/write timeouts (`None` disables a timeout)
    fn set_timeouts(&self, _read: Option<Duration>, _write: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    /// Release the stream. Must be idempotent.
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn peer(&self) -> String {
        self.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(read)?;
        self.set_write_timeout(write)?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // Peer already gone
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
