//! The two descriptor-passing gateways: one for plain files, one for TCP
//! sockets. Both present the same shape -- marshal metadata, transfer the
//! kernel object by whatever mechanism the platform offers, hand back a
//! reconstructed object -- behind a single shared interface so the framing
//! logic in `conn` never has to branch on platform.

pub mod file;
pub mod socket;

#[cfg(unix)]
mod scm_rights;

#[cfg(unix)]
mod file_unix;
#[cfg(windows)]
mod file_windows;

#[cfg(unix)]
mod socket_unix;
#[cfg(windows)]
mod socket_windows;

use crate::error::Result;
use crate::listener::Pipe;
use crate::tcpconn::TcpConn;
use std::fs::File;

/// Sends/receives `File`s across the pipe. On Windows, carries the peer's
/// process id so a handle can be duplicated directly into its process.
pub struct FileGateway {
    #[cfg(windows)]
    peer_pid: u32,
}

impl FileGateway {
    #[cfg(unix)]
    pub fn new(_peer_pid: Option<u32>) -> FileGateway {
        FileGateway {}
    }

    #[cfg(windows)]
    pub fn new(peer_pid: Option<u32>) -> FileGateway {
        FileGateway {
            peer_pid: peer_pid.expect("windows pipes always exchange a PID at connect time"),
        }
    }

    #[cfg(unix)]
    pub fn send(&self, pipe: &mut Pipe, file: File, name: &str, extra: &[u8]) -> Result<()> {
        file_unix::send(pipe, file, name, extra)
    }

    #[cfg(windows)]
    pub fn send(&self, pipe: &mut Pipe, file: File, name: &str, extra: &[u8]) -> Result<()> {
        file_windows::send(pipe, file, name, extra, self.peer_pid)
    }

    #[cfg(unix)]
    pub fn receive(&self, pipe: &mut Pipe, max_len: u32) -> Result<(File, String, bool)> {
        file_unix::receive(pipe, max_len)
    }

    #[cfg(windows)]
    pub fn receive(&self, pipe: &mut Pipe, max_len: u32) -> Result<(File, String, bool)> {
        file_windows::receive(pipe, max_len)
    }
}

/// Sends/receives TCP sockets across the pipe, reconstructing a `TcpConn` on
/// the receiving side.
pub struct SocketGateway {
    #[cfg(windows)]
    peer_pid: u32,
}

impl SocketGateway {
    #[cfg(unix)]
    pub fn new(_peer_pid: Option<u32>) -> SocketGateway {
        SocketGateway {}
    }

    #[cfg(windows)]
    pub fn new(peer_pid: Option<u32>) -> SocketGateway {
        SocketGateway {
            peer_pid: peer_pid.expect("windows pipes always exchange a PID at connect time"),
        }
    }

    #[cfg(unix)]
    pub fn send(
        &self,
        pipe: &mut Pipe,
        conn: std::net::TcpStream,
        peeked: &[u8],
        extra: &[u8],
    ) -> Result<()> {
        socket_unix::send(pipe, conn, peeked, extra)
    }

    #[cfg(windows)]
    pub fn send(
        &self,
        pipe: &mut Pipe,
        conn: std::net::TcpStream,
        peeked: &[u8],
        extra: &[u8],
    ) -> Result<()> {
        socket_windows::send(pipe, conn, peeked, extra, self.peer_pid)
    }

    #[cfg(unix)]
    pub fn receive(&self, pipe: &mut Pipe, max_len: u32) -> Result<(TcpConn, bool)> {
        socket_unix::receive(pipe, max_len)
    }

    #[cfg(windows)]
    pub fn receive(&self, pipe: &mut Pipe, max_len: u32) -> Result<(TcpConn, bool)> {
        socket_windows::receive(pipe, max_len)
    }
}
