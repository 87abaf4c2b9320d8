//! Input tee: one blocking reader thread feeding two consumers.
//!
//! Every chunk read from the console goes first to the sentinel watcher and
//! then to the caller's stream. Both queues are unbounded; console input is
//! human-paced, so a consumer that falls behind never stalls the other one or
//! the pump itself.

use console_handle::Console;
use std::io;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::io::ReadBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the sentinel watcher sees of the input.
#[derive(Debug)]
pub(crate) enum Tap {
    Data(Vec<u8>),
    Failed(io::ErrorKind),
}

pub(crate) struct TeeOutputs {
    pub(crate) caller: InputStream,
    pub(crate) watcher: mpsc::UnboundedReceiver<Tap>,
}

/// Spawn the blocking thread that reads the console until end of stream,
/// a read error, or `closed` fires.
pub(crate) fn spawn_input_pump(
    console: Arc<dyn Console>,
    closed: CancellationToken,
    chunk_size: usize,
    wait: Duration,
) -> io::Result<TeeOutputs> {
    let (caller_tx, caller_rx) = mpsc::unbounded_channel::<io::Result<Vec<u8>>>();
    let (tap_tx, tap_rx) = mpsc::unbounded_channel::<Tap>();

    std::thread::Builder::new()
        .name("term-input".into())
        .spawn(move || {
            let mut buf = vec![0u8; chunk_size];
            loop {
                if closed.is_cancelled() {
                    break;
                }
                // Poll with a timeout so we can check for close
                match console.wait_readable(wait) {
                    // Input that arrives after close belongs to the next owner
                    Ok(true) if closed.is_cancelled() => break,
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        warn!("Error waiting for console input: {}", e);
                        let _ = tap_tx.send(Tap::Failed(e.kind()));
                        let _ = caller_tx.send(Err(e));
                        break;
                    }
                }
                match console.read(&mut buf) {
                    Ok(0) => {
                        debug!("Console input reached end of stream");
                        break;
                    }
                    Ok(n) => {
                        let chunk = buf[..n].to_vec();
                        let _ = tap_tx.send(Tap::Data(chunk.clone()));
                        // The caller may have dropped its stream; keep feeding the watcher.
                        let _ = caller_tx.send(Ok(chunk));
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        warn!("Error reading console input: {}", e);
                        let _ = tap_tx.send(Tap::Failed(e.kind()));
                        let _ = caller_tx.send(Err(e));
                        break;
                    }
                }
            }
            debug!("Console input pump exiting");
        })?;

    Ok(TeeOutputs {
        caller: InputStream::new(caller_rx),
        watcher: tap_rx,
    })
}

/// Caller-facing side of the tee, presenting queued chunks as a byte stream.
pub(crate) struct InputStream {
    rx: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    pos: usize,
}

impl InputStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
        }
    }

    /// Fill `buf` from the current chunk, waiting for the next one if needed.
    /// Leaves `buf` untouched once the pump has stopped and every chunk has
    /// been delivered.
    pub(crate) fn poll_read(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        if self.pos >= self.pending.len() {
            match ready!(self.rx.poll_recv(cx)) {
                None => return Poll::Ready(Ok(())),
                Some(Err(e)) => return Poll::Ready(Err(e)),
                Some(Ok(chunk)) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
            }
        }
        let available = &self.pending[self.pos..];
        let n = available.len().min(buf.remaining());
        buf.put_slice(&available[..n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }

    /// Read into `buf`. `Ok(0)` means the pump has stopped and every chunk
    /// has been delivered.
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut buf = ReadBuf::new(buf);
        std::future::poll_fn(|cx| self.poll_read(cx, &mut buf)).await?;
        Ok(buf.filled().len())
    }
}
