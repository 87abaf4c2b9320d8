use console_handle::{Console, ConsoleError, WinSize};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TermConfig;
use crate::error::TermError;
use crate::size::{Size, SizeWatcher};
use crate::tee::{self, InputStream};
use crate::{poller, watcher};

/// A raw-mode session on a console.
///
/// Input read through the session is also scanned for the exit sentinel;
/// output is written straight to the console. The console is restored exactly
/// once, by whichever of [`Terminal::close`], the sentinel watcher, or drop
/// gets there first.
///
/// Besides the inherent methods, `Terminal` is an [`AsyncRead`] +
/// [`AsyncWrite`] stream, so it works with `tokio::io::copy` and buffered
/// readers.
pub struct Terminal {
    shared: Arc<Shared>,
    input: tokio::sync::Mutex<InputStream>,
    // Console write in flight for `AsyncWrite`
    write_op: Option<JoinHandle<io::Result<usize>>>,
}

/// State shared between the session and its background tasks
pub(crate) struct Shared {
    pub(crate) console: Arc<dyn Console>,
    pub(crate) closed: CancellationToken,
    state: RwLock<SizeState>,
    close_result: Mutex<Option<Result<(), ConsoleError>>>,
    channel_capacity: usize,
}

struct SizeState {
    size: Size,
    notify: Option<mpsc::Sender<Size>>,
    watcher: Option<SizeWatcher>,
}

impl Terminal {
    /// Start a session on the current process' console with default config.
    ///
    /// Panics if none of stderr, stdout or stdin is a terminal.
    #[cfg(unix)]
    pub fn new(cancel: CancellationToken) -> Result<Self, TermError> {
        Self::with_config(cancel, TermConfig::default())
    }

    /// Start a session on the current process' console.
    ///
    /// Panics if none of stderr, stdout or stdin is a terminal.
    #[cfg(unix)]
    pub fn with_config(cancel: CancellationToken, config: TermConfig) -> Result<Self, TermError> {
        let console: Arc<dyn Console> = Arc::new(console_handle::current());
        Self::from_console(console, cancel, config)
    }

    /// Start a session on `console`.
    ///
    /// Puts the console in raw mode and starts the input tee, the sentinel
    /// watcher and the size poller on the current tokio runtime. The poller
    /// stops when `cancel` fires. On error the console is left as it was found.
    pub fn from_console(
        console: Arc<dyn Console>,
        cancel: CancellationToken,
        config: TermConfig,
    ) -> Result<Self, TermError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TermError::NoRuntime)?;

        console.set_raw()?;
        let ws = match sync_size(console.as_ref()) {
            Ok(ws) => ws,
            Err(e) => {
                restore_after_failure(console.as_ref());
                return Err(e.into());
            }
        };

        let closed = CancellationToken::new();
        let tee = match tee::spawn_input_pump(
            console.clone(),
            closed.clone(),
            config.read_chunk_size,
            config.input_wait(),
        ) {
            Ok(tee) => tee,
            Err(e) => {
                restore_after_failure(console.as_ref());
                return Err(TermError::Spawn(e));
            }
        };

        let size = Size::from(ws);
        let shared = Arc::new(Shared {
            console,
            closed,
            state: RwLock::new(SizeState {
                size,
                notify: None,
                watcher: None,
            }),
            close_result: Mutex::new(None),
            channel_capacity: config.size_channel_capacity,
        });

        runtime.spawn(watcher::watch_input(
            shared.clone(),
            tee.watcher,
            config.exit_rune,
        ));
        runtime.spawn(poller::poll_size(
            shared.clone(),
            cancel,
            config.poll_interval(),
            size,
        ));

        info!(
            "Terminal session started on {} ({})",
            shared.console.name(),
            size
        );

        Ok(Self {
            shared,
            input: tokio::sync::Mutex::new(tee.caller),
            write_op: None,
        })
    }

    /// Read console input. Returns `Ok(0)` once the session's input has ended
    /// and everything read before that has been delivered.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.lock().await.read(buf).await
    }

    /// Write to the console. Output is never scanned for the exit sentinel.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let console = self.shared.console.clone();
        let data = buf.to_vec();
        tokio::task::spawn_blocking(move || console.write(&data))
            .await
            .map_err(io::Error::other)?
    }

    pub async fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf).await {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Size as of the most recent poll
    pub fn size(&self) -> Size {
        self.shared.size()
    }

    /// Subscribe to size changes.
    ///
    /// Every call returns a handle to the same channel.
    pub fn watch_size(&self) -> SizeWatcher {
        self.shared.watch_size()
    }

    /// Restore the console and stop background work.
    ///
    /// Safe to call any number of times from any task; every call returns the
    /// result of the first restore.
    pub fn close(&self) -> Result<(), ConsoleError> {
        self.shared.close()
    }

    /// Resolves once the session has closed, however that happened.
    pub async fn closed(&self) {
        self.shared.closed.cancelled().await
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }
}

impl Terminal {
    fn poll_write_op(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<usize>> {
        let Some(op) = self.write_op.as_mut() else {
            return Poll::Ready(Ok(0));
        };
        let res = ready!(Pin::new(op).poll(cx));
        self.write_op = None;
        Poll::Ready(res.map_err(io::Error::other).and_then(|written| written))
    }
}

impl AsyncRead for Terminal {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut().input.get_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for Terminal {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.write_op.is_none() {
            if buf.is_empty() {
                return Poll::Ready(Ok(0));
            }
            // A pending write is retried with the same buffer, so the copy
            // taken here stays valid until it completes.
            let console = this.shared.console.clone();
            let data = buf.to_vec();
            this.write_op = Some(tokio::task::spawn_blocking(move || console.write(&data)));
        }
        this.poll_write_op(cx)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.write_op.is_none() {
            return Poll::Ready(Ok(()));
        }
        ready!(this.poll_write_op(cx))?;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.shared.close();
    }
}

impl Shared {
    fn read_state(&self) -> RwLockReadGuard<'_, SizeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SizeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn size(&self) -> Size {
        self.read_state().size
    }

    /// Cache `size`, returning the subscriber's sender if there is one.
    pub(crate) fn update_size(&self, size: Size) -> Option<mpsc::Sender<Size>> {
        let mut state = self.write_state();
        state.size = size;
        state.notify.clone()
    }

    pub(crate) fn watch_size(&self) -> SizeWatcher {
        let mut state = self.write_state();
        if let Some(watcher) = state.watcher.as_ref() {
            return watcher.clone();
        }
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let watcher = SizeWatcher::new(rx, self.closed.clone());
        if !self.closed.is_cancelled() {
            state.notify = Some(tx);
        }
        state.watcher = Some(watcher.clone());
        watcher
    }

    pub(crate) fn close(&self) -> Result<(), ConsoleError> {
        let mut result = self
            .close_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(res) = result.as_ref() {
            return res.clone();
        }

        let res = self.console.reset();
        {
            let mut state = self.write_state();
            state.notify = None;
            self.closed.cancel();
        }

        match &res {
            Ok(()) => info!("Terminal session closed, {} restored", self.console.name()),
            Err(e) => warn!("Failed to restore {}: {}", self.console.name(), e),
        }
        *result = Some(res.clone());
        res
    }
}

/// Query the size and apply it back to the console. Backends that cannot
/// resize are tolerated.
fn sync_size(console: &dyn Console) -> Result<WinSize, ConsoleError> {
    let ws = console.size()?;
    match console.resize(ws) {
        Ok(()) => {}
        Err(e) if e.is_unsupported() => {
            debug!("{} does not support resize, keeping {}", console.name(), ws);
        }
        Err(e) => return Err(e),
    }
    Ok(ws)
}

fn restore_after_failure(console: &dyn Console) {
    if let Err(e) = console.reset() {
        warn!(
            "Failed to restore {} after setup error: {}",
            console.name(),
            e
        );
    }
}
