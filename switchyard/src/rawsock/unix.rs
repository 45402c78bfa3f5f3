use crate::codec::{fit_length, would_block};
use crate::error::{Error, Result};
use crate::rawsock::Deadline;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

/// A raw, non-blocking UNIX socket/file descriptor with independent
/// read/write deadlines, reconstructed from a descriptor handed across the
/// pipe out-of-band.
pub struct RawSocket {
    fd: RawFd,
    read_deadline: Deadline,
    write_deadline: Deadline,
}

const POLLIN: libc::c_short = libc::POLLIN;
const POLLOUT: libc::c_short = libc::POLLOUT;

impl RawSocket {
    /// Takes ownership of `fd`; it is put into non-blocking mode if it isn't
    /// already (descriptor-passing platforms may hand over a blocking fd).
    pub fn from_raw_fd(fd: RawFd) -> Result<RawSocket> {
        set_nonblocking(fd)?;
        Ok(RawSocket {
            fd,
            read_deadline: Deadline::unset(),
            write_deadline: Deadline::unset(),
        })
    }

    pub fn set_read_deadline(&mut self, d: Deadline) {
        self.read_deadline = d;
    }

    pub fn set_write_deadline(&mut self, d: Deadline) {
        self.write_deadline = d;
    }

    pub fn set_deadline(&mut self, d: Deadline) {
        self.read_deadline = d;
        self.write_deadline = d;
    }

    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if self.read_deadline.is_expired() {
            return Err(Error::Timeout);
        }
        loop {
            let n = unsafe {
                libc::recv(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                )
            };
            if n >= 0 {
                return Ok(fit_length(n as isize));
            }
            let err = std::io::Error::last_os_error();
            if would_block(&err) {
                wait(self.fd, POLLIN, self.read_deadline)?;
                continue;
            }
            return Err(err.into());
        }
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if self.write_deadline.is_expired() {
            return Err(Error::Timeout);
        }
        loop {
            let n = unsafe {
                libc::send(
                    self.fd,
                    buf.as_ptr() as *const libc::c_void,
                    buf.len(),
                    libc::MSG_NOSIGNAL,
                )
            };
            if n >= 0 {
                return Ok(fit_length(n as isize));
            }
            let err = std::io::Error::last_os_error();
            if would_block(&err) {
                wait(self.fd, POLLOUT, self.write_deadline)?;
                continue;
            }
            return Err(err.into());
        }
    }

    /// Non-blocking probe: is there data to read right now, without waiting.
    pub fn is_readable_now(&self) -> bool {
        poll_now(self.fd, POLLIN)
    }

    pub fn shutdown_read(&self) -> Result<()> {
        shutdown(self.fd, libc::SHUT_RD)
    }

    pub fn shutdown_write(&self) -> Result<()> {
        shutdown(self.fd, libc::SHUT_WR)
    }

    pub fn close(&mut self) -> Result<()> {
        if self.fd >= 0 {
            let rc = unsafe { libc::close(self.fd) };
            self.fd = -1;
            if rc != 0 {
                return Err(std::io::Error::last_os_error().into());
            }
        }
        Ok(())
    }
}

impl AsRawFd for RawSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl FromRawFd for RawSocket {
    unsafe fn from_raw_fd(fd: RawFd) -> RawSocket {
        RawSocket {
            fd,
            read_deadline: Deadline::unset(),
            write_deadline: Deadline::unset(),
        }
    }
}

impl IntoRawFd for RawSocket {
    fn into_raw_fd(mut self) -> RawFd {
        let fd = self.fd;
        self.fd = -1;
        fd
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn shutdown(fd: RawFd, how: libc::c_int) -> Result<()> {
    let rc = unsafe { libc::shutdown(fd, how) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

fn set_nonblocking(fd: RawFd) -> Result<()> {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL, 0);
        if flags < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let rc = libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        if rc < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Wait for `fd` to become ready for `events` (POLLIN/POLLOUT), honoring
/// `deadline`. A deadline already in the past fails immediately rather than
/// making a zero-timeout poll() call mean "forever" by accident.
fn wait(fd: RawFd, events: libc::c_short, deadline: Deadline) -> Result<()> {
    if deadline.is_expired() && deadline.remaining().is_some() {
        return Err(Error::Timeout);
    }
    let timeout_ms = match deadline.remaining() {
        None => -1,
        Some(d) => d.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
    };
    let mut fds = [libc::pollfd {
        fd,
        events,
        revents: 0,
    }];
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, timeout_ms) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    if rc == 0 {
        return Err(Error::Timeout);
    }
    if fds[0].revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0
        && fds[0].revents & events == 0
    {
        return Err(Error::ClosedPipe);
    }
    Ok(())
}

/// Immediate, zero-timeout readiness probe -- distinct from `wait` because a
/// probe is never "too late", only ready or not ready yet.
fn poll_now(fd: RawFd, events: libc::c_short) -> bool {
    let mut fds = [libc::pollfd {
        fd,
        events,
        revents: 0,
    }];
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, 0) };
    rc > 0 && fds[0].revents & events != 0
}
