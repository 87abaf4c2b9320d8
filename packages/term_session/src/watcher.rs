use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::Shared;
use crate::tee::Tap;

/// Scan the watcher side of the tee and close the session on end of
/// stream, a read failure, or a chunk starting with `exit_rune`.
pub(crate) async fn watch_input(
    shared: Arc<Shared>,
    mut taps: mpsc::UnboundedReceiver<Tap>,
    exit_rune: char,
) {
    loop {
        let tap = tokio::select! {
            _ = shared.closed.cancelled() => return,
            tap = taps.recv() => tap,
        };
        match tap {
            None => {
                debug!("Console input ended, closing terminal session");
                break;
            }
            Some(Tap::Failed(kind)) => {
                warn!("Console input failed ({:?}), closing terminal session", kind);
                break;
            }
            Some(Tap::Data(chunk)) => {
                if chunk.is_empty() {
                    continue;
                }
                // Only the first character of a chunk is inspected.
                if first_char(&chunk) == Some(exit_rune) {
                    info!("Exit sentinel {:?} received, closing terminal session", exit_rune);
                    break;
                }
            }
        }
    }

    // Failure is already logged by close
    let _ = shared.close();
}

/// Decode the first UTF-8 character of `bytes`, if it is valid.
pub(crate) fn first_char(bytes: &[u8]) -> Option<char> {
    let head = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
    };
    valid.chars().next()
}
