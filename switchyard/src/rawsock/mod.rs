//! A raw, non-blocking socket handle with independent read/write deadlines.
//!
//! The platform modules below each expose a `RawSocket` with the same
//! inherent methods; `mod.rs` just picks the right one and leaves the
//! deadline bookkeeping (`Deadline`) common to both.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use self::unix::RawSocket;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::RawSocket;

use std::time::{Duration, Instant};

/// A deadline is either unset (wait forever), or a wall-clock instant past
/// which any blocking wait fails with `Error::Timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn unset() -> Deadline {
        Deadline(None)
    }

    pub fn at(instant: Instant) -> Deadline {
        Deadline(Some(instant))
    }

    /// `None` means wait forever, `Some(Duration::ZERO)` or negative means
    /// "already expired, fail now".
    pub fn remaining(&self) -> Option<Duration> {
        match self.0 {
            None => None,
            Some(instant) => Some(instant.saturating_duration_since(Instant::now())),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.0 {
            None => false,
            Some(instant) => Instant::now() >= instant,
        }
    }
}
