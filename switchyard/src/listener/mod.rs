//! Opens the local pipe and, on platforms that need it, performs the PID
//! handshake immediately after connect/accept -- before the first command
//! byte ever crosses the wire.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use self::unix::Pipe;
#[cfg(windows)]
pub use self::windows::Pipe;

use crate::conn::Conn;
use crate::error::Result;
use std::path::Path;

pub struct Listener {
    #[cfg(unix)]
    inner: unix::Listener,
    #[cfg(windows)]
    inner: windows::Listener,
    max_frame_len: u32,
}

pub fn listen<P: AsRef<Path>>(name: P, max_frame_len: u32) -> Result<Listener> {
    #[cfg(unix)]
    let inner = unix::listen(name)?;
    #[cfg(windows)]
    let inner = windows::listen(name)?;
    Ok(Listener {
        inner,
        max_frame_len,
    })
}

impl Listener {
    pub fn accept(&self) -> Result<Conn> {
        #[cfg(unix)]
        {
            let pipe = self.inner.accept()?;
            Ok(Conn::new(pipe, None, self.max_frame_len))
        }
        #[cfg(windows)]
        {
            let (pipe, peer_pid) = self.inner.accept()?;
            Ok(Conn::new(pipe, Some(peer_pid), self.max_frame_len))
        }
    }

    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}

pub fn dial<P: AsRef<Path>>(name: P, max_frame_len: u32) -> Result<Conn> {
    #[cfg(unix)]
    {
        let pipe = unix::dial(name)?;
        Ok(Conn::new(pipe, None, max_frame_len))
    }
    #[cfg(windows)]
    {
        let (pipe, peer_pid) = windows::dial(name)?;
        Ok(Conn::new(pipe, Some(peer_pid), max_frame_len))
    }
}
