use std::fmt;
use std::io;

/// Error conditions reported by any switchyard operation.
#[derive(Debug)]
pub enum Error {
    /// The underlying pipe connection is closed or was reset by the peer.
    ClosedPipe,
    /// A frame did not match the wire format: bad command byte, oversized
    /// length prefix, wrong descriptor count, or similar.
    Protocol(String),
    /// A read or write deadline elapsed before the operation completed.
    Timeout,
    /// The queue listener this call targets has been closed.
    ClosedQueue,
    /// A queued push was cancelled by its caller before it could complete.
    Cancelled,
    /// Any other OS-level failure (socket errors, duplication failures,
    /// event-object failures).
    System(io::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ClosedPipe => write!(f, "pipe connection closed"),
            Error::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Error::Timeout => write!(f, "deadline exceeded"),
            Error::ClosedQueue => write!(f, "queue listener closed"),
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::System(e) => write!(f, "system error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::System(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Error::ClosedPipe,
            _ => Error::System(io_error),
        }
    }
}

impl Error {
    pub fn protocol<S: Into<String>>(msg: S) -> Error {
        Error::Protocol(msg.into())
    }
}
