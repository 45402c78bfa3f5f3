//! Shared `SCM_RIGHTS` plumbing used by both the file gateway and the socket
//! gateway on UNIX-like systems: send/receive exactly one descriptor
//! alongside an ordinary message body.

use crate::error::{Error, Result};
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

/// Send `payload` as the ordinary message body of a `sendmsg`, with `fd`
/// attached as an `SCM_RIGHTS` ancillary message on the first call. Loops
/// over a short `sendmsg` the same way `codec::write_all` loops over a short
/// `write`, since a stream `AF_UNIX` socket can accept only part of the
/// payload under send-buffer pressure; the descriptor is only ever attached
/// once, since re-attaching it on a retry would pass it a second time.
pub fn send_with_fd(pipe: &UnixStream, payload: &[u8], fd: RawFd) -> Result<()> {
    let sock = pipe.as_raw_fd();
    let mut space = cmsg_space(mem::size_of::<RawFd>());
    let mut off = 0;

    while off == 0 || off < payload.len() {
        let iov = libc::iovec {
            iov_base: payload[off..].as_ptr() as *mut libc::c_void,
            iov_len: payload.len() - off,
        };
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = &iov as *const _ as *mut _;
        msg.msg_iovlen = 1;

        if off == 0 {
            msg.msg_control = space.as_mut_ptr() as *mut libc::c_void;
            msg.msg_controllen = space.len() as _;
            unsafe {
                let cmsg = libc::CMSG_FIRSTHDR(&msg);
                (*cmsg).cmsg_level = libc::SOL_SOCKET;
                (*cmsg).cmsg_type = libc::SCM_RIGHTS;
                (*cmsg).cmsg_len = libc::CMSG_LEN(mem::size_of::<RawFd>() as u32) as _;
                std::ptr::write(libc::CMSG_DATA(cmsg) as *mut RawFd, fd);
            }
        }

        let n = unsafe { libc::sendmsg(sock, &msg, libc::MSG_NOSIGNAL) };
        if n >= 0 {
            if n == 0 {
                return Err(Error::ClosedPipe);
            }
            off += n as usize;
            continue;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::WouldBlock {
            wait_writable(sock)?;
            continue;
        }
        return Err(err.into());
    }
    Ok(())
}

/// Receive exactly one descriptor alongside `buf`, retrying on
/// `EWOULDBLOCK`.
pub fn recv_with_fd(pipe: &UnixStream, buf: &mut [u8]) -> Result<RawFd> {
    let sock = pipe.as_raw_fd();
    let mut space = cmsg_space(mem::size_of::<RawFd>());

    loop {
        let mut iov = libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        };
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = space.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = space.len() as _;

        let n = unsafe { libc::recvmsg(sock, &mut msg, 0) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                wait_readable(sock)?;
                continue;
            }
            return Err(err.into());
        }
        if n == 0 {
            return Err(Error::ClosedPipe);
        }

        let cmsg = unsafe { libc::CMSG_FIRSTHDR(&msg) };
        if cmsg.is_null() {
            return Err(Error::protocol("expected one descriptor, received none"));
        }
        let fd = unsafe { std::ptr::read(libc::CMSG_DATA(cmsg) as *const RawFd) };
        return Ok(fd);
    }
}

fn cmsg_space(payload: usize) -> Vec<u8> {
    let len = unsafe { libc::CMSG_SPACE(payload as u32) } as usize;
    vec![0u8; len]
}

fn wait_readable(fd: RawFd) -> Result<()> {
    poll_one(fd, libc::POLLIN)
}

fn wait_writable(fd: RawFd) -> Result<()> {
    poll_one(fd, libc::POLLOUT)
}

fn poll_one(fd: RawFd, events: libc::c_short) -> Result<()> {
    let mut fds = [libc::pollfd {
        fd,
        events,
        revents: 0,
    }];
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, -1) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}
