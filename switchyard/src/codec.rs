//! Big-endian framing primitives shared by every gateway and the connection
//! itself. Mirrors the length-prefix/backpatch approach the wire format uses
//! throughout: a u32 big-endian count followed by that many bytes.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Refuse to allocate a read buffer larger than this unless the caller raises
/// the ceiling explicitly (see `Config::max_frame_len`).
pub const DEFAULT_MAX_LEN: u32 = 16 * 1024 * 1024;

/// Write `buf.len()` as a u32 big-endian prefix, then `buf` itself.
pub fn write_bytes<W: Write>(w: &mut W, buf: &[u8]) -> Result<()> {
    w.write_u32::<BigEndian>(buf.len() as u32)?;
    write_all(w, buf)?;
    Ok(())
}

/// Read a u32 big-endian length prefix followed by that many bytes.
///
/// A length prefix beyond `max_len` is a protocol violation, not an
/// allocation the caller is forced to service.
pub fn read_bytes<R: Read>(r: &mut R, max_len: u32) -> Result<Vec<u8>> {
    let len = read_len(r, max_len)?;
    let mut buf = vec![0u8; len as usize];
    read_all(r, &mut buf)?;
    Ok(buf)
}

/// Read just the u32 big-endian length prefix, validating against `max_len`.
pub fn read_len<R: Read>(r: &mut R, max_len: u32) -> Result<u32> {
    let len = r.read_u32::<BigEndian>()?;
    if len > max_len {
        return Err(Error::protocol(format!(
            "length prefix {} exceeds ceiling {}",
            len, max_len
        )));
    }
    Ok(len)
}

pub fn write_bool<W: Write>(w: &mut W, b: bool) -> Result<()> {
    w.write_u8(if b { 1 } else { 0 })?;
    Ok(())
}

pub fn read_bool<R: Read>(r: &mut R) -> Result<bool> {
    Ok(r.read_u8()? != 0)
}

/// Loop a write until every byte in `buf` has been accepted. A short write
/// that isn't an error is not expected from a blocking pipe, but the retry
/// loop costs nothing and matches the completion guarantee the framing
/// relies on.
pub fn write_all<W: Write>(w: &mut W, buf: &[u8]) -> Result<()> {
    let mut off = 0;
    while off < buf.len() {
        let n = w.write(&buf[off..])?;
        if n == 0 {
            return Err(Error::ClosedPipe);
        }
        off += n;
    }
    Ok(())
}

/// Loop a read until `buf` is completely filled. A read returning 0 before
/// the buffer is full means the peer closed mid-frame: fatal, not a short
/// read to retry past.
pub fn read_all<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut off = 0;
    while off < buf.len() {
        let n = r.read(&mut buf[off..])?;
        if n == 0 {
            return Err(Error::ClosedPipe);
        }
        off += n;
    }
    Ok(())
}

/// Reserve a four byte placeholder, run `body`, then backpatch the BE u32
/// length of whatever `body` wrote into the placeholder. Used where the
/// payload size isn't known until after it's been serialized.
pub fn write_with_length<F>(out: &mut Vec<u8>, body: F) -> Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let start = out.len();
    out.extend_from_slice(&[0u8; 4]);
    body(out)?;
    let written = (out.len() - start - 4) as u32;
    out[start..start + 4].copy_from_slice(&written.to_be_bytes());
    Ok(())
}

/// Normalize a raw `isize`/negative syscall return into a `usize`, per the
/// raw socket wrapper's "never return negative" contract.
pub fn fit_length(n: isize) -> usize {
    if n < 0 {
        0
    } else {
        n as usize
    }
}

pub(crate) fn would_block(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn bytes_round_trip() {
        for payload in [&b""[..], &b"x"[..], &b"hello world"[..]] {
            let mut buf = Vec::new();
            write_bytes(&mut buf, payload).unwrap();
            let mut cursor = Cursor::new(buf);
            let out = read_bytes(&mut cursor, DEFAULT_MAX_LEN).unwrap();
            assert_eq!(out, payload);
        }
    }

    #[test]
    fn length_prefix_over_ceiling_is_protocol_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(DEFAULT_MAX_LEN + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        let err = read_bytes(&mut cursor, DEFAULT_MAX_LEN).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn write_with_length_backpatches_actual_size() {
        let mut out = Vec::new();
        write_with_length(&mut out, |buf| {
            buf.extend_from_slice(b"abcde");
            Ok(())
        })
        .unwrap();
        assert_eq!(&out[0..4], &5u32.to_be_bytes());
        assert_eq!(&out[4..], b"abcde");
    }

    #[test]
    fn short_read_past_peer_close_is_closed_pipe() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let mut buf = [0u8; 4];
        let err = read_all(&mut cursor, &mut buf).unwrap_err();
        assert!(matches!(err, Error::ClosedPipe));
    }
}
