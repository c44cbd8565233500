//! Pointer monitor: raw blocking reads from the pointer device node, one
//! count per movement/button packet.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::activity::SharedCounter;
use crate::core::errors::{GlowdError, Result};
use crate::daemon::signals::CancelToken;
use crate::monitor::{ActivityMonitor, MonitorKind, record_hits};

/// PS/2-style packets from the aggregate pointer node are 3 bytes: buttons
/// plus two relative deltas.
const PACKET_LEN: usize = 3;

/// Counts packets from a pointer device node (default `/dev/input/mice`).
pub struct PointerMonitor {
    source: File,
    path: PathBuf,
}

impl PointerMonitor {
    /// Open the pointer device node.
    pub fn open(path: &Path) -> Result<Self> {
        let source = File::open(path).map_err(|source| GlowdError::io(path, source))?;
        Ok(Self {
            source,
            path: path.to_path_buf(),
        })
    }
}

impl ActivityMonitor for PointerMonitor {
    fn kind(&self) -> MonitorKind {
        MonitorKind::Pointer
    }

    fn run(mut self: Box<Self>, counter: &SharedCounter, cancel: &CancelToken) -> Result<()> {
        let mut packet = [0u8; PACKET_LEN];
        while !cancel.is_cancelled() {
            match self.source.read(&mut packet) {
                // EOF: the device went away; this monitor is done.
                Ok(0) => return Ok(()),
                Ok(_) => record_hits(counter, 1)?,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(GlowdError::io(&self.path, err)),
            }
        }
        Ok(())
    }
}
