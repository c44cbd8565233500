//! Filesystem monitor: recursive watch that counts access, open, and modify
//! notifications, coalescing batches delivered together into one increment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::activity::SharedCounter;
use crate::core::errors::{GlowdError, Result};
use crate::daemon::signals::CancelToken;
use crate::monitor::{ActivityMonitor, MonitorKind, record_hits};

/// How long to wait on the event channel before re-checking cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(500);

/// Access, open, or modify notifications count as activity; create/remove
/// chatter and metadata-only noise do not.
pub(crate) fn qualifies(event: &Event) -> bool {
    matches!(event.kind, EventKind::Access(_) | EventKind::Modify(_))
}

/// Counts qualifying notifications under a watch root.
pub struct FilesystemMonitor {
    // Held for its side effect: dropping the watcher stops delivery.
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    path: PathBuf,
}

impl FilesystemMonitor {
    /// Install a recursive watch rooted at `watch_path`.
    pub fn open(watch_path: &Path) -> Result<Self> {
        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(watch_path, RecursiveMode::Recursive)?;
        info!(path = %watch_path.display(), "watching filesystem activity");
        Ok(Self {
            _watcher: watcher,
            events: rx,
            path: watch_path.to_path_buf(),
        })
    }

    /// Drain everything already delivered alongside `first`, returning the
    /// qualifying-event count for one coalesced increment.
    fn drain_batch(&self, first: &notify::Result<Event>) -> i32 {
        let mut hits = i32::from(matches!(first, Ok(event) if qualifies(event)));
        while let Ok(delivered) = self.events.try_recv() {
            match delivered {
                Ok(event) if qualifies(&event) => hits = hits.saturating_add(1),
                Ok(_) => {}
                Err(err) => debug!(path = %self.path.display(), %err, "watch event error"),
            }
        }
        hits
    }
}

impl ActivityMonitor for FilesystemMonitor {
    fn kind(&self) -> MonitorKind {
        MonitorKind::Filesystem
    }

    fn run(self: Box<Self>, counter: &SharedCounter, cancel: &CancelToken) -> Result<()> {
        while !cancel.is_cancelled() {
            let first = match self.events.recv_timeout(CANCEL_POLL) {
                Ok(delivered) => delivered,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(GlowdError::ChannelClosed {
                        component: "filesystem-monitor",
                    });
                }
            };
            if let Err(err) = &first {
                debug!(path = %self.path.display(), %err, "watch event error");
            }
            let hits = self.drain_batch(&first);
            if hits > 0 {
                record_hits(counter, hits)?;
            }
        }
        Ok(())
    }
}
