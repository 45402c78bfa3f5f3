//! SCM_RIGHTS ancillary-message descriptor passing for `File`, on top of the
//! UNIX domain pipe connection.

use crate::codec::{read_len, write_with_length};
use crate::error::Result;
use crate::gateway::file::FileMeta;
use crate::gateway::scm_rights::{recv_with_fd, send_with_fd};
use std::fs::File;
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::os::unix::net::UnixStream;

pub fn send(pipe: &UnixStream, file: File, name: &str, extra: &[u8]) -> Result<()> {
    let meta = FileMeta {
        name: name.to_string(),
        extra: !extra.is_empty(),
    };
    let mut payload = Vec::new();
    write_with_length(&mut payload, |buf| meta.serialize(buf))?;

    let fd = file.as_raw_fd();
    send_with_fd(pipe, &payload, fd)?;
    // Transfer succeeded: the sender relinquishes the descriptor. `file` is
    // dropped here, closing it exactly once, on our side, now that the
    // receiver has its own copy.
    drop(file);

    if meta.extra {
        let mut w = pipe;
        crate::codec::write_bytes(&mut w, extra)?;
    }
    Ok(())
}

pub fn receive(pipe: &UnixStream, max_len: u32) -> Result<(File, String, bool)> {
    let len = {
        let mut r = pipe;
        read_len(&mut r, max_len)?
    };
    let mut buf = vec![0u8; len as usize];
    let fd = recv_with_fd(pipe, &mut buf)?;
    let meta = FileMeta::deserialize(&mut &buf[..], max_len)?;
    let file = unsafe { File::from_raw_fd(fd) };
    Ok((file, meta.name, meta.extra))
}
