//! Cross-platform IPC for handing live kernel objects -- open files and
//! established TCP connections -- from one process to another over a local
//! named pipe.
//!
//! The receiving process gets a fully-owned, working copy of the object: a
//! `File` it can read from the start, or a `TcpConn` it can read, write, and
//! set deadlines on as though it had accepted the connection itself.

pub mod codec;
pub mod command;
pub mod config;
pub mod conn;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod logging;
pub mod queue;
pub mod rawsock;
pub mod tcpconn;

pub use command::Command;
pub use config::Config;
pub use conn::Conn;
pub use error::{Error, Result};
pub use listener::Listener;
pub use queue::{CancelHandle, CancelToken, QueueAddr, QueueListener};
pub use tcpconn::TcpConn;

use std::path::Path;

/// Binds the local pipe endpoint and returns a listener. `max_frame_len`
/// bounds any single length-prefixed frame this connection will accept.
pub fn listen<P: AsRef<Path>>(name: P, max_frame_len: u32) -> Result<Listener> {
    listener::listen(name, max_frame_len)
}

/// Opens a client end of the local pipe.
pub fn dial<P: AsRef<Path>>(name: P, max_frame_len: u32) -> Result<Conn> {
    listener::dial(name, max_frame_len)
}
