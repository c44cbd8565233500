//! Activity monitors: independent workers that block on an event source and
//! feed the shared counter.

pub mod filesystem;
pub mod keyboard;
pub mod pointer;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::activity::SharedCounter;
use crate::core::errors::{GlowdError, Result};
use crate::daemon::signals::CancelToken;

pub use filesystem::FilesystemMonitor;
pub use keyboard::KeyboardMonitor;
pub use pointer::PointerMonitor;

/// The three activity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    /// Key-down events from the classified keyboard device.
    Keyboard,
    /// Packets from the pointer device node.
    Pointer,
    /// Filesystem notifications under the watch root.
    Filesystem,
}

impl MonitorKind {
    /// Short name used in thread names and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Pointer => "pointer",
            Self::Filesystem => "filesystem",
        }
    }
}

/// A worker that blocks on one event source and increments the counter for
/// every qualifying event.
///
/// The loop's only suspension point is the blocking read, so a monitor with
/// no incoming events observes cancellation only at its next wakeup. A read
/// error or EOF ends the monitor's own loop; the supervisor decides what
/// that means for the rest of the daemon.
pub trait ActivityMonitor: Send {
    /// Which activity class this monitor samples.
    fn kind(&self) -> MonitorKind;

    /// Run the monitor loop until cancellation or source loss.
    fn run(self: Box<Self>, counter: &SharedCounter, cancel: &CancelToken) -> Result<()>;
}

/// Exit notice a worker thread posts when its loop ends.
pub struct MonitorExit {
    /// Which monitor exited.
    pub kind: MonitorKind,
    /// How its loop ended.
    pub outcome: Result<()>,
}

/// Spawn a monitor on a named worker thread. The thread posts a
/// [`MonitorExit`] when the loop ends, however it ends.
pub fn spawn_monitor(
    monitor: Box<dyn ActivityMonitor>,
    counter: SharedCounter,
    cancel: CancelToken,
    exits: Sender<MonitorExit>,
) -> Result<std::thread::JoinHandle<()>> {
    let kind = monitor.kind();
    std::thread::Builder::new()
        .name(format!("glowd-{}", kind.name()))
        .spawn(move || {
            info!(monitor = kind.name(), "monitor started");
            let outcome = monitor.run(&counter, &cancel);
            match &outcome {
                Ok(()) => info!(monitor = kind.name(), "monitor exited"),
                Err(err) => warn!(monitor = kind.name(), %err, "monitor failed"),
            }
            let _ = exits.send(MonitorExit { kind, outcome });
        })
        .map_err(|source| GlowdError::Spawn {
            worker: kind.name(),
            details: source.to_string(),
        })
}

/// Record `by` qualifying events, absorbing skippable counter errors:
/// a sample lost to a torn-down counter is acceptable.
pub(crate) fn record_hits(counter: &SharedCounter, by: i32) -> Result<()> {
    match counter.increment(by) {
        Ok(()) => Ok(()),
        Err(err) if err.is_skippable() => Ok(()),
        Err(err) => Err(err),
    }
}
