use console_handle::WinSize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Terminal dimensions in character cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl From<WinSize> for Size {
    fn from(ws: WinSize) -> Self {
        Self {
            rows: ws.height,
            cols: ws.width,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Last size seen by the poller; reports only changes.
#[derive(Debug)]
pub(crate) struct SizeTracker {
    last: Size,
}

impl SizeTracker {
    pub(crate) fn new(initial: Size) -> Self {
        Self { last: initial }
    }

    /// Record `next`, returning it if either dimension changed.
    pub(crate) fn observe(&mut self, next: Size) -> Option<Size> {
        if next == self.last {
            return None;
        }
        self.last = next;
        Some(next)
    }
}

/// Receiving side of a session's size-change notifications.
///
/// Every clone shares one underlying channel: a value is delivered to
/// whichever clone receives first. Once the session closes, `recv` drains
/// any pending value and then yields `None` without waiting.
#[derive(Clone, Debug)]
pub struct SizeWatcher {
    rx: Arc<Mutex<mpsc::Receiver<Size>>>,
    closed: CancellationToken,
}

impl SizeWatcher {
    pub(crate) fn new(rx: mpsc::Receiver<Size>, closed: CancellationToken) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
            closed,
        }
    }

    /// Wait for the next size change. `None` once the session is closed.
    pub async fn recv(&self) -> Option<Size> {
        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            size = rx.recv() => size,
            _ = self.closed.cancelled() => rx.try_recv().ok(),
        }
    }

    /// Take a pending size change without waiting.
    pub fn try_recv(&self) -> Option<Size> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}
