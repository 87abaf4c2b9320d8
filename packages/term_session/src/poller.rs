use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::session::Shared;
use crate::size::{Size, SizeTracker};

/// Poll the console size every `period` until `cancel` fires or the
/// session closes. The cached size is updated before subscribers are told.
pub(crate) async fn poll_size(
    shared: Arc<Shared>,
    cancel: CancellationToken,
    period: Duration,
    initial: Size,
) {
    let mut tracker = SizeTracker::new(initial);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Size poller cancelled");
                return;
            }
            _ = shared.closed.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let ws = match shared.console.size() {
            Ok(ws) => ws,
            Err(e) => {
                trace!("Size query failed, retrying next tick: {}", e);
                continue;
            }
        };
        let Some(size) = tracker.observe(Size::from(ws)) else {
            continue;
        };
        debug!("Console resized to {}", size);

        let Some(notify) = shared.update_size(size) else {
            continue;
        };
        // Blocks until the subscriber makes room
        tokio::select! {
            res = notify.send(size) => {
                if res.is_err() {
                    trace!("Size subscriber gone");
                }
            }
            _ = cancel.cancelled() => return,
            _ = shared.closed.cancelled() => return,
        }
    }
}
