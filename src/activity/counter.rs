//! Shared activity counter: one mutex-guarded integer fed by every monitor
//! and drained by the control loop.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::fcntl::{Flock, FlockArg};
use parking_lot::Mutex;

use crate::core::errors::{GlowdError, Result};

/// Cloneable handle to the daemon-wide activity counter.
///
/// All clones address the same value. Creation is exclusive per lock path:
/// a second live instance with the same identity fails instead of sharing
/// state with (or attaching to) the first. Only the supervisor destroys the
/// counter; after destruction every operation fails with a skippable
/// [`GlowdError::CounterDestroyed`].
#[derive(Clone)]
pub struct SharedCounter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    value: Mutex<i32>,
    destroyed: AtomicBool,
    lock: Mutex<Option<InstanceLock>>,
}

struct InstanceLock {
    guard: Flock<File>,
    path: PathBuf,
}

impl SharedCounter {
    /// Allocate the counter, taking an exclusive instance lock at `lock_path`.
    ///
    /// Fails with [`GlowdError::AlreadyRunning`] when another process holds
    /// the lock. The counter starts at 0.
    pub fn create(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)
            .map_err(|source| GlowdError::io(lock_path, source))?;

        let mut guard = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => guard,
            // EAGAIN covers EWOULDBLOCK: the lock is held by a live instance.
            Err((_, nix::errno::Errno::EAGAIN)) => {
                return Err(GlowdError::AlreadyRunning {
                    path: lock_path.to_path_buf(),
                });
            }
            Err((_, errno)) => {
                return Err(GlowdError::io(lock_path, std::io::Error::from(errno)));
            }
        };
        // Record the holder for operator diagnosis; lock semantics do not
        // depend on the contents.
        let _ = writeln!(guard, "{}", std::process::id());

        Ok(Self {
            inner: Arc::new(CounterInner {
                value: Mutex::new(0),
                destroyed: AtomicBool::new(false),
                lock: Mutex::new(Some(InstanceLock {
                    guard,
                    path: lock_path.to_path_buf(),
                })),
            }),
        })
    }

    /// Add `by` to the counter. Blocks until the mutex is available; the
    /// critical section is a single saturating add.
    pub fn increment(&self, by: i32) -> Result<()> {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(GlowdError::CounterDestroyed);
        }
        let mut value = self.inner.value.lock();
        *value = value.saturating_add(by);
        Ok(())
    }

    /// Atomically fetch the current value and replace it with `f(value)`,
    /// returning the pre-transform value.
    ///
    /// The fetch and the store share one critical section, so an increment
    /// lands wholly before or wholly after the transform, never inside it.
    pub fn read_and_transform<F>(&self, f: F) -> Result<i32>
    where
        F: FnOnce(i32) -> i32,
    {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(GlowdError::CounterDestroyed);
        }
        let mut value = self.inner.value.lock();
        let old = *value;
        *value = f(old);
        Ok(old)
    }

    /// Current value, read under the mutex.
    pub fn read(&self) -> Result<i32> {
        self.read_and_transform(|value| value)
    }

    /// Release the instance lock and mark the counter destroyed.
    ///
    /// Must be called exactly once; a second call reports
    /// [`GlowdError::CounterDestroyed`] without disturbing clones that are
    /// still mid-operation.
    pub fn destroy(&self) -> Result<()> {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return Err(GlowdError::CounterDestroyed);
        }
        if let Some(lock) = self.inner.lock.lock().take() {
            let path = lock.path.clone();
            drop(lock.guard);
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}
