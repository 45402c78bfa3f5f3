use crate::codec::{read_bool, read_bytes, write_bool, write_bytes};
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Metadata carried alongside a passed TCP socket: both endpoint addresses,
/// whatever the sender already peeked off the wire, and whether a trailing
/// opaque data frame follows.
pub struct SocketMeta {
    pub local_addr: SocketAddr,
    pub remote_addr: SocketAddr,
    pub peeked: Vec<u8>,
    pub extra: bool,
}

impl SocketMeta {
    pub fn serialize<W: Write>(&self, w: &mut W) -> Result<()> {
        write_addr(w, &self.local_addr)?;
        write_addr(w, &self.remote_addr)?;
        write_bytes(w, &self.peeked)?;
        write_bool(w, self.extra)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(r: &mut R, max_len: u32) -> Result<SocketMeta> {
        let local_addr = read_addr(r, max_len)?;
        let remote_addr = read_addr(r, max_len)?;
        let peeked = read_bytes(r, max_len)?;
        let extra = read_bool(r)?;
        Ok(SocketMeta {
            local_addr,
            remote_addr,
            peeked,
            extra,
        })
    }
}

fn write_addr<W: Write>(w: &mut W, addr: &SocketAddr) -> Result<()> {
    match addr.ip() {
        IpAddr::V4(v4) => write_bytes(w, &v4.octets())?,
        IpAddr::V6(v6) => write_bytes(w, &v6.octets())?,
    }
    w.write_i32::<BigEndian>(addr.port() as i32)?;
    write_bytes(w, zone_of(addr).as_bytes())?;
    Ok(())
}

fn read_addr<R: Read>(r: &mut R, max_len: u32) -> Result<SocketAddr> {
    let ip_bytes = read_bytes(r, max_len)?;
    let port = r.read_i32::<BigEndian>()?;
    let _zone = read_bytes(r, max_len)?;
    let ip = match ip_bytes.len() {
        4 => IpAddr::V4(Ipv4Addr::new(
            ip_bytes[0],
            ip_bytes[1],
            ip_bytes[2],
            ip_bytes[3],
        )),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&ip_bytes);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        0 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        other => {
            return Err(Error::protocol(format!(
                "address byte string of length {} is neither 0, 4 nor 16",
                other
            )))
        }
    };
    Ok(SocketAddr::new(ip, port as u16))
}

/// IPv6 zone/scope ids aren't modeled by `std::net`; carried as an empty
/// string to keep the wire field present for round-trip compatibility.
fn zone_of(_addr: &SocketAddr) -> &'static str {
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn socket_meta_round_trips_v4_and_v6() {
        let meta = SocketMeta {
            local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080),
            remote_addr: SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443),
            peeked: b"ab".to_vec(),
            extra: true,
        };
        let mut buf = Vec::new();
        meta.serialize(&mut buf).unwrap();
        let out = SocketMeta::deserialize(&mut &buf[..], 1 << 20).unwrap();
        assert_eq!(out.local_addr, meta.local_addr);
        assert_eq!(out.remote_addr, meta.remote_addr);
        assert_eq!(out.peeked, meta.peeked);
        assert_eq!(out.extra, meta.extra);
    }

    #[test]
    fn empty_ip_byte_string_becomes_unspecified_v4() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &[]).unwrap();
        buf.extend_from_slice(&0i32.to_be_bytes());
        write_bytes(&mut buf, b"").unwrap();
        let addr = read_addr(&mut &buf[..], 1 << 20).unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
