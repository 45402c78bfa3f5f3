//! SCM_RIGHTS descriptor passing for TCP sockets, on top of the same
//! ancillary-message machinery `file_unix` uses.

use crate::codec::write_with_length;
use crate::error::Result;
use crate::gateway::scm_rights::{recv_with_fd, send_with_fd};
use crate::gateway::socket::SocketMeta;
use crate::rawsock::RawSocket;
use crate::tcpconn::TcpConn;
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;

pub fn send(pipe: &UnixStream, conn: TcpStream, peeked: &[u8], extra: &[u8]) -> Result<()> {
    let meta = SocketMeta {
        local_addr: conn.local_addr()?,
        remote_addr: conn.peer_addr()?,
        peeked: peeked.to_vec(),
        extra: !extra.is_empty(),
    };
    let mut payload = Vec::new();
    write_with_length(&mut payload, |buf| meta.serialize(buf))?;

    let fd = conn.as_raw_fd();
    send_with_fd(pipe, &payload, fd)?;
    drop(conn);

    if meta.extra {
        let mut w = pipe;
        crate::codec::write_bytes(&mut w, extra)?;
    }
    Ok(())
}

pub fn receive(pipe: &UnixStream, max_len: u32) -> Result<(TcpConn, bool)> {
    let len = {
        let mut r = pipe;
        crate::codec::read_len(&mut r, max_len)?
    };
    let mut buf = vec![0u8; len as usize];
    let fd = recv_with_fd(pipe, &mut buf)?;
    let meta = SocketMeta::deserialize(&mut &buf[..], max_len)?;
    let sock = RawSocket::from_raw_fd(fd)?;
    let conn = TcpConn::new(sock, meta.local_addr, meta.remote_addr, meta.peeked);
    Ok((conn, meta.extra))
}
