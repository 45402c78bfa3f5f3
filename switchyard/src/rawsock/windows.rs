use crate::codec::fit_length;
use crate::error::{Error, Result};
use crate::rawsock::Deadline;
use std::os::windows::io::{AsRawSocket, FromRawSocket, IntoRawSocket, RawSocket as RawSocketHandle};
use windows_sys::Win32::Networking::WinSock::{
    closesocket, ioctlsocket, recv, send, shutdown, WSACloseEvent, WSACreateEvent, WSAEventSelect,
    WSAGetLastError, WSAResetEvent, WSAWaitForMultipleEvents, FD_CLOSE, FD_READ, FD_WRITE,
    FIONBIO, SD_RECEIVE, SD_SEND, SOCKET, SOCKET_ERROR, WSAEWOULDBLOCK, WSA_WAIT_EVENT_0,
    WSA_WAIT_FAILED, WSA_WAIT_TIMEOUT,
};
use windows_sys::Win32::System::Threading::INFINITE;

/// A raw, non-blocking Windows socket with independent read/write deadlines,
/// reconstructed in this process via `WSASocket` from a duplicated protocol
/// info blob.
pub struct RawSocket {
    sock: SOCKET,
    read_deadline: Deadline,
    write_deadline: Deadline,
}

impl RawSocket {
    /// Takes ownership of `sock`; switches it to non-blocking mode, since the
    /// deadline machinery below relies on WSAEWOULDBLOCK retries.
    pub fn from_raw_socket(sock: SOCKET) -> Result<RawSocket> {
        let mut nonblocking: u32 = 1;
        let rc = unsafe { ioctlsocket(sock, FIONBIO, &mut nonblocking) };
        if rc == SOCKET_ERROR {
            return Err(last_error());
        }
        Ok(RawSocket {
            sock,
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
            let n = unsafe { recv(self.sock, buf.as_mut_ptr(), buf.len() as i32, 0) };
            if n != SOCKET_ERROR {
                return Ok(fit_length(n as isize));
            }
            if unsafe { WSAGetLastError() } == WSAEWOULDBLOCK {
                wait(self.sock, FD_READ | FD_CLOSE, self.read_deadline)?;
                continue;
            }
            return Err(last_error());
        }
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if self.write_deadline.is_expired() {
            return Err(Error::Timeout);
        }
        loop {
            let n = unsafe { send(self.sock, buf.as_ptr(), buf.len() as i32, 0) };
            if n != SOCKET_ERROR {
                return Ok(fit_length(n as isize));
            }
            if unsafe { WSAGetLastError() } == WSAEWOULDBLOCK {
                wait(self.sock, FD_WRITE | FD_CLOSE, self.write_deadline)?;
                continue;
            }
            return Err(last_error());
        }
    }

    pub fn is_readable_now(&self) -> bool {
        poll_now(self.sock, FD_READ | FD_CLOSE)
    }

    pub fn shutdown_read(&self) -> Result<()> {
        if unsafe { shutdown(self.sock, SD_RECEIVE) } == SOCKET_ERROR {
            return Err(last_error());
        }
        Ok(())
    }

    pub fn shutdown_write(&self) -> Result<()> {
        if unsafe { shutdown(self.sock, SD_SEND) } == SOCKET_ERROR {
            return Err(last_error());
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.sock != 0 {
            let rc = unsafe { closesocket(self.sock) };
            self.sock = 0;
            if rc == SOCKET_ERROR {
                return Err(last_error());
            }
        }
        Ok(())
    }
}

impl AsRawSocket for RawSocket {
    fn as_raw_socket(&self) -> RawSocketHandle {
        self.sock as RawSocketHandle
    }
}

impl FromRawSocket for RawSocket {
    unsafe fn from_raw_socket(sock: RawSocketHandle) -> RawSocket {
        RawSocket {
            sock: sock as SOCKET,
            read_deadline: Deadline::unset(),
            write_deadline: Deadline::unset(),
        }
    }
}

impl IntoRawSocket for RawSocket {
    fn into_raw_socket(mut self) -> RawSocketHandle {
        let sock = self.sock;
        self.sock = 0;
        sock as RawSocketHandle
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn last_error() -> Error {
    std::io::Error::from_raw_os_error(unsafe { WSAGetLastError() }).into()
}

/// Create a fresh event object per call, arm it for `events`, and wait on it
/// up to `deadline`. The event is closed on every exit path, matching the
/// per-call allocation discipline used elsewhere in this wrapper.
fn wait(sock: SOCKET, events: i32, deadline: Deadline) -> Result<()> {
    if deadline.is_expired() && deadline.remaining().is_some() {
        return Err(Error::Timeout);
    }
    let event = unsafe { WSACreateEvent() };
    if event == 0 {
        return Err(last_error());
    }
    let result = (|| {
        if unsafe { WSAEventSelect(sock, event, events) } == SOCKET_ERROR {
            return Err(last_error());
        }
        let timeout_ms = match deadline.remaining() {
            None => INFINITE,
            Some(d) => d.as_millis().min(INFINITE as u128 - 1) as u32,
        };
        let rc = unsafe { WSAWaitForMultipleEvents(1, &event, 0, timeout_ms, 0) };
        if rc == WSA_WAIT_TIMEOUT {
            return Err(Error::Timeout);
        }
        if rc == WSA_WAIT_FAILED {
            return Err(last_error());
        }
        let _ = rc - WSA_WAIT_EVENT_0;
        unsafe { WSAResetEvent(event) };
        Ok(())
    })();
    unsafe { WSACloseEvent(event) };
    result
}

/// Immediate, zero-timeout readiness probe -- distinct from `wait` because a
/// probe is never "too late", only ready or not ready yet.
fn poll_now(sock: SOCKET, events: i32) -> bool {
    let event = unsafe { WSACreateEvent() };
    if event == 0 {
        return false;
    }
    let ready = (|| {
        if unsafe { WSAEventSelect(sock, event, events) } == SOCKET_ERROR {
            return false;
        }
        let rc = unsafe { WSAWaitForMultipleEvents(1, &event, 0, 0, 0) };
        rc == WSA_WAIT_EVENT_0
    })();
    unsafe { WSACloseEvent(event) };
    ready
}
