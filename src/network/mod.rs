//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread and one [`Session`] per connection
//! - No state shared between connections besides the chunk source

mod transport;
mod session;
mod server;
mod client;

pub use transport::Transport;
pub use session::{Session, SessionState};
pub use server::{Server, ServerHandler, ShutdownHandle};
pub use client::{Client, ClientHandler, MAX_IN_FLIGHT};
