//! The reconstituted TCP connection handed back to callers after a socket
//! handoff: a byte stream over a raw, non-blocking socket, with deadlines
//! and a buffer of bytes the sender already peeked off the wire before
//! handing the socket over.

use crate::error::Result;
use crate::rawsock::{Deadline, RawSocket};
use std::net::SocketAddr;
use std::time::Instant;

pub struct TcpConn {
    sock: RawSocket,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    peeked: Vec<u8>,
    peeked_pos: usize,
}

impl TcpConn {
    pub(crate) fn new(
        sock: RawSocket,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        peeked: Vec<u8>,
    ) -> TcpConn {
        TcpConn {
            sock,
            local_addr,
            remote_addr,
            peeked,
            peeked_pos: 0,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    fn has_peeked(&self) -> bool {
        self.peeked_pos < self.peeked.len()
    }

    /// Drains any remaining peeked bytes before touching the socket, so a
    /// caller never sees peeked and live bytes interleaved within one read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.has_peeked() {
            let remaining = &self.peeked[self.peeked_pos..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.peeked_pos += n;
            if !self.sock.is_readable_now() {
                return Ok(n);
            }
            if n == buf.len() {
                return Ok(n);
            }
            let more = self.sock.read(&mut buf[n..])?;
            return Ok(n + more);
        }
        self.sock.read(buf)
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.sock.write(buf)
    }

    pub fn close(&mut self) -> Result<()> {
        self.sock.close()
    }

    pub fn close_read(&self) -> Result<()> {
        self.sock.shutdown_read()
    }

    pub fn close_write(&self) -> Result<()> {
        self.sock.shutdown_write()
    }

    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.sock.set_read_deadline(to_deadline(deadline));
    }

    pub fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.sock.set_write_deadline(to_deadline(deadline));
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.sock.set_deadline(to_deadline(deadline));
    }
}

fn to_deadline(instant: Option<Instant>) -> Deadline {
    match instant {
        Some(i) => Deadline::at(i),
        None => Deadline::unset(),
    }
}

impl std::io::Read for TcpConn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        TcpConn::read(self, buf).map_err(|e| match e {
            crate::error::Error::Timeout => std::io::ErrorKind::TimedOut.into(),
            crate::error::Error::System(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        })
    }
}

impl std::io::Write for TcpConn {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        TcpConn::write(self, buf).map_err(|e| match e {
            crate::error::Error::Timeout => std::io::ErrorKind::TimedOut.into(),
            crate::error::Error::System(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        })
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
