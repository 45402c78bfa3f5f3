//! Handle-duplication descriptor passing for TCP sockets on Windows. The
//! sender duplicates its socket into the receiver's process with
//! `WSADuplicateSocket`, producing a protocol-info blob the receiver turns
//! back into a live socket with `WSASocket(..., FROM_PROTOCOL_INFO)`.

use crate::codec::{read_bytes, write_bytes, write_with_length};
use crate::error::{Error, Result};
use crate::gateway::socket::SocketMeta;
use crate::rawsock::RawSocket;
use crate::tcpconn::TcpConn;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::windows::io::{AsRawSocket, FromRawSocket};
use windows_sys::Win32::Networking::WinSock::{
    WSADuplicateSocketW, WSASocketW, FROM_PROTOCOL_INFO, SOCKET, WSAPROTOCOL_INFOW,
};

pub fn send<P: Read + Write>(
    pipe: &mut P,
    conn: TcpStream,
    peeked: &[u8],
    extra: &[u8],
    peer_pid: u32,
) -> Result<()> {
    let local_addr = conn.local_addr()?;
    let remote_addr = conn.peer_addr()?;
    let sock = conn.as_raw_socket() as SOCKET;

    let mut info: WSAPROTOCOL_INFOW = unsafe { std::mem::zeroed() };
    let rc = unsafe { WSADuplicateSocketW(sock, peer_pid, &mut info) };
    if rc != 0 {
        return Err(Error::System(std::io::Error::last_os_error()));
    }

    let meta = SocketMeta {
        local_addr,
        remote_addr,
        peeked: peeked.to_vec(),
        extra: !extra.is_empty(),
    };
    let mut payload = Vec::new();
    write_with_length(&mut payload, |buf| {
        write_protocol_info(buf, &info)?;
        meta.serialize(buf)
    })?;
    pipe.write_all(&payload)?;
    drop(conn);

    if meta.extra {
        write_bytes(pipe, extra)?;
    }
    Ok(())
}

pub fn receive<P: Read + Write>(pipe: &mut P, max_len: u32) -> Result<(TcpConn, bool)> {
    let len = crate::codec::read_len(pipe, max_len)?;
    let mut buf = vec![0u8; len as usize];
    crate::codec::read_all(pipe, &mut buf)?;
    let mut cursor = &buf[..];
    let info = read_protocol_info(&mut cursor, max_len)?;
    let meta = SocketMeta::deserialize(&mut cursor, max_len)?;

    let raw = unsafe {
        WSASocketW(
            FROM_PROTOCOL_INFO,
            FROM_PROTOCOL_INFO,
            FROM_PROTOCOL_INFO,
            &info,
            0,
            0,
        )
    };
    if raw == windows_sys::Win32::Networking::WinSock::INVALID_SOCKET {
        return Err(Error::System(std::io::Error::last_os_error()));
    }
    let sock = RawSocket::from_raw_socket(raw)?;
    let conn = TcpConn::new(sock, meta.local_addr, meta.remote_addr, meta.peeked);
    Ok((conn, meta.extra))
}

/// Field-by-field big-endian encoding of `WSAPROTOCOL_INFOW`, in the same
/// order the struct declares them.
fn write_protocol_info<W: Write>(w: &mut W, info: &WSAPROTOCOL_INFOW) -> Result<()> {
    w.write_u32::<BigEndian>(info.dwServiceFlags1)?;
    w.write_u32::<BigEndian>(info.dwServiceFlags2)?;
    w.write_u32::<BigEndian>(info.dwServiceFlags3)?;
    w.write_u32::<BigEndian>(info.dwServiceFlags4)?;
    w.write_u32::<BigEndian>(info.dwProviderFlags)?;
    w.write_u32::<BigEndian>(info.ProviderId.data1)?;
    w.write_u16::<BigEndian>(info.ProviderId.data2)?;
    w.write_u16::<BigEndian>(info.ProviderId.data3)?;
    w.write_all(&info.ProviderId.data4)?;
    w.write_u32::<BigEndian>(info.dwCatalogEntryId)?;
    w.write_i32::<BigEndian>(info.ProtocolChain.ChainLen)?;
    for entry in info.ProtocolChain.ChainEntries.iter() {
        w.write_u32::<BigEndian>(*entry)?;
    }
    w.write_i32::<BigEndian>(info.iVersion)?;
    w.write_i32::<BigEndian>(info.iAddressFamily)?;
    w.write_i32::<BigEndian>(info.iMaxSockAddr)?;
    w.write_i32::<BigEndian>(info.iMinSockAddr)?;
    w.write_i32::<BigEndian>(info.iSocketType)?;
    w.write_i32::<BigEndian>(info.iProtocol)?;
    w.write_i32::<BigEndian>(info.iProtocolMaxOffset)?;
    w.write_i32::<BigEndian>(info.iNetworkByteOrder)?;
    w.write_i32::<BigEndian>(info.iSecurityScheme)?;
    w.write_u32::<BigEndian>(info.dwMessageSize)?;
    w.write_u32::<BigEndian>(info.dwProviderReserved)?;
    let name = String::from_utf16_lossy(&info.szProtocol);
    write_bytes(w, name.trim_end_matches('\0').as_bytes())?;
    Ok(())
}

fn read_protocol_info<R: Read>(r: &mut R, max_len: u32) -> Result<WSAPROTOCOL_INFOW> {
    let mut info: WSAPROTOCOL_INFOW = unsafe { std::mem::zeroed() };
    info.dwServiceFlags1 = r.read_u32::<BigEndian>()?;
    info.dwServiceFlags2 = r.read_u32::<BigEndian>()?;
    info.dwServiceFlags3 = r.read_u32::<BigEndian>()?;
    info.dwServiceFlags4 = r.read_u32::<BigEndian>()?;
    info.dwProviderFlags = r.read_u32::<BigEndian>()?;
    info.ProviderId.data1 = r.read_u32::<BigEndian>()?;
    info.ProviderId.data2 = r.read_u16::<BigEndian>()?;
    info.ProviderId.data3 = r.read_u16::<BigEndian>()?;
    r.read_exact(&mut info.ProviderId.data4)?;
    info.dwCatalogEntryId = r.read_u32::<BigEndian>()?;
    info.ProtocolChain.ChainLen = r.read_i32::<BigEndian>()?;
    for entry in info.ProtocolChain.ChainEntries.iter_mut() {
        *entry = r.read_u32::<BigEndian>()?;
    }
    info.iVersion = r.read_i32::<BigEndian>()?;
    info.iAddressFamily = r.read_i32::<BigEndian>()?;
    info.iMaxSockAddr = r.read_i32::<BigEndian>()?;
    info.iMinSockAddr = r.read_i32::<BigEndian>()?;
    info.iSocketType = r.read_i32::<BigEndian>()?;
    info.iProtocol = r.read_i32::<BigEndian>()?;
    info.iProtocolMaxOffset = r.read_i32::<BigEndian>()?;
    info.iNetworkByteOrder = r.read_i32::<BigEndian>()?;
    info.iSecurityScheme = r.read_i32::<BigEndian>()?;
    info.dwMessageSize = r.read_u32::<BigEndian>()?;
    info.dwProviderReserved = r.read_u32::<BigEndian>()?;
    let name_bytes = read_bytes(r, max_len)?;
    let wide: Vec<u16> = String::from_utf8_lossy(&name_bytes).encode_utf16().collect();
    let n = wide.len().min(info.szProtocol.len());
    info.szProtocol[..n].copy_from_slice(&wide[..n]);
    Ok(info)
}
