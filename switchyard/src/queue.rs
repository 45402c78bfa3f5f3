//! A bounded hand-off queue that exposes an accept-style interface to local
//! consumers, with backpressure on the producer side and clean, idempotent
//! shutdown.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Fires when dropped. `push` selects on it alongside the data channel so a
/// caller blocked on a full queue can still be woken up without closing the
/// whole listener.
pub struct CancelToken(Receiver<()>);

pub struct CancelHandle(Sender<()>);

impl CancelHandle {
    pub fn cancel(self) {
        drop(self.0);
    }
}

/// A token that never fires; used by callers that don't need `push` to be
/// individually cancellable.
pub fn never_cancel() -> CancelToken {
    let (_tx, rx) = bounded(0);
    CancelToken(rx)
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(0);
    (CancelHandle(tx), CancelToken(rx))
}

/// A dummy address for queue listeners, matching the shape of a real network
/// address without pretending to be one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAddr;

impl QueueAddr {
    pub fn network(&self) -> &'static str {
        "queue"
    }
}

impl std::fmt::Display for QueueAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "queue")
    }
}

pub struct QueueListener<T> {
    data_tx: Sender<T>,
    data_rx: Receiver<T>,
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
    closed: AtomicBool,
}

impl<T> QueueListener<T> {
    pub fn new(capacity: usize) -> QueueListener<T> {
        let (data_tx, data_rx) = bounded(capacity);
        let (close_tx, close_rx) = bounded(0);
        QueueListener {
            data_tx,
            data_rx,
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
            closed: AtomicBool::new(false),
        }
    }

    /// Blocks until there is room, `cancel` fires, or the listener closes.
    ///
    /// Checks `closed` before racing `select!` on the data and close
    /// channels: once `close()` has drained the queue, the data channel has
    /// free capacity again, and an unconditional `select!` could otherwise
    /// pick the `send` arm over the `close_rx` arm and enqueue an item into a
    /// listener that will never drain it.
    pub fn push(&self, item: T, cancel: &CancelToken) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ClosedQueue);
        }
        select! {
            send(self.data_tx, item) -> res => res.map_err(|_| Error::ClosedQueue),
            recv(self.close_rx) -> _ => Err(Error::ClosedQueue),
            recv(cancel.0) -> _ => Err(Error::Cancelled),
        }
    }

    /// Blocks until an item is available or the listener closes.
    pub fn accept(&self) -> Result<T> {
        select! {
            recv(self.data_rx) -> res => res.map_err(|_| Error::ClosedQueue),
            recv(self.close_rx) -> _ => Err(Error::ClosedQueue),
        }
    }

    /// Idempotent. Wakes every blocked `push`/`accept` and drops whatever was
    /// still queued, closing each item through its own `Drop`.
    pub fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        let mut guard = self.close_tx.lock().unwrap();
        if let Some(tx) = guard.take() {
            drop(tx);
        }
        drop(guard);
        while let Ok(item) = self.data_rx.try_recv() {
            drop(item);
        }
        Ok(())
    }

    pub fn addr(&self) -> QueueAddr {
        QueueAddr
    }
}
