//! Cooperative cancellation: a daemon-wide token set by the signal listener
//! thread and observed by every loop.
//!
//! A worker blocked in a device read does not observe cancellation until its
//! next event arrives or the read errors; only the control loop's interval
//! sleep is woken early. Workers still blocked at teardown are reclaimed by
//! process exit.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::info;

use crate::core::errors::{GlowdError, Result};

/// Cloneable cancellation token with a wakeable sleep.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelToken {
    /// Fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; wakes every sleeper.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Sleep for `timeout` or until cancelled, whichever comes first.
    /// Returns true when the token is cancelled.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            if self.inner.wake.wait_until(&mut cancelled, deadline).timed_out() {
                return *cancelled;
            }
        }
        true
    }
}

/// Consumes termination-class signals on a dedicated thread and cancels the
/// daemon token on receipt.
pub struct SignalListener {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalListener {
    /// Install handlers for SIGHUP, SIGINT, SIGQUIT, and SIGTERM and start
    /// the listener thread. SIGKILL cannot be intercepted and remains the
    /// immediate-fatal path.
    pub fn install(token: CancelToken) -> Result<Self> {
        let mut signals = Signals::new([SIGHUP, SIGINT, SIGQUIT, SIGTERM])
            .map_err(|source| GlowdError::Spawn {
                worker: "signal-listener",
                details: source.to_string(),
            })?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("glowd-signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    info!(signal, "shutdown signal received");
                    token.cancel();
                }
            })
            .map_err(|source| GlowdError::Spawn {
                worker: "signal-listener",
                details: source.to_string(),
            })?;
        Ok(Self { handle, thread })
    }

    /// Stop the listener thread and uninstall its iterator.
    pub fn shutdown(self) {
        self.handle.close();
        let _ = self.thread.join();
    }
}
