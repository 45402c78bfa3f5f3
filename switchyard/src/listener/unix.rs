use crate::error::Result;
use std::os::unix::net::{UnixListener as StdUnixListener, UnixStream};
use std::path::Path;

/// The local pipe connection on UNIX-like systems is just a UNIX domain
/// stream socket; no PID exchange is needed since descriptors travel
/// out-of-band over the same socket.
pub type Pipe = UnixStream;

pub struct Listener {
    inner: StdUnixListener,
}

pub fn listen<P: AsRef<Path>>(path: P) -> Result<Listener> {
    let _ = std::fs::remove_file(&path);
    let inner = StdUnixListener::bind(path)?;
    Ok(Listener { inner })
}

impl Listener {
    pub fn accept(&self) -> Result<Pipe> {
        let (pipe, _addr) = self.inner.accept()?;
        Ok(pipe)
    }

    pub fn close(self) -> Result<()> {
        drop(self.inner);
        Ok(())
    }
}

pub fn dial<P: AsRef<Path>>(path: P) -> Result<Pipe> {
    Ok(UnixStream::connect(path)?)
}
