//! Keyboard monitor: classifies the keyboard among the input devices by its
//! capability set, then counts key-down transitions.

use std::path::{Path, PathBuf};

use evdev::{AttributeSetRef, Device, InputEventKind, Key};
use tracing::{debug, info};

use crate::activity::SharedCounter;
use crate::core::config::DeviceConfig;
use crate::core::errors::{GlowdError, Result};
use crate::daemon::signals::CancelToken;
use crate::monitor::{ActivityMonitor, MonitorKind, record_hits};

/// Key-down transition; releases are 0, autorepeats are 2. Only transitions
/// to down count as activity.
const KEY_DOWN: i32 = 1;

/// A device is keyboard-shaped when its key capability set contains all four
/// of: an escape-class key, a letter key, a whitespace key, and a function
/// key. Pointer devices and multimedia remotes report some of these, never
/// all four.
pub(crate) fn has_keyboard_signature(keys: &AttributeSetRef<Key>) -> bool {
    keys.contains(Key::KEY_ESC)
        && keys.contains(Key::KEY_A)
        && keys.contains(Key::KEY_SPACE)
        && keys.contains(Key::KEY_F1)
}

/// Probe `<input_dir>/eventN` in numeric-suffix order and return the first
/// keyboard-shaped device. Earlier candidates are never revisited.
///
/// The probe is bounded by `max_probe_index`; exhausting it (no keyboard
/// present) is a startup error rather than an unbounded scan.
pub fn find_keyboard(input_dir: &Path, max_probe_index: u32) -> Result<(PathBuf, Device)> {
    for index in 0..=max_probe_index {
        let candidate = input_dir.join(format!("event{index}"));
        let Ok(device) = Device::open(&candidate) else {
            continue;
        };
        if device
            .supported_keys()
            .is_some_and(has_keyboard_signature)
        {
            info!(
                device = %candidate.display(),
                name = device.name().unwrap_or("<unnamed>"),
                "classified keyboard device"
            );
            return Ok((candidate, device));
        }
        debug!(device = %candidate.display(), "not keyboard-shaped, skipping");
    }
    Err(GlowdError::DeviceProbe {
        dir: input_dir.to_path_buf(),
        probed: max_probe_index + 1,
    })
}

/// Counts key-down transitions from the classified keyboard device.
pub struct KeyboardMonitor {
    device: Device,
    path: PathBuf,
}

impl KeyboardMonitor {
    /// Probe for the keyboard and open it.
    pub fn open(devices: &DeviceConfig) -> Result<Self> {
        let (path, device) = find_keyboard(&devices.input_dir, devices.max_probe_index)?;
        Ok(Self { device, path })
    }
}

impl ActivityMonitor for KeyboardMonitor {
    fn kind(&self) -> MonitorKind {
        MonitorKind::Keyboard
    }

    fn run(mut self: Box<Self>, counter: &SharedCounter, cancel: &CancelToken) -> Result<()> {
        while !cancel.is_cancelled() {
            let events = self
                .device
                .fetch_events()
                .map_err(|source| GlowdError::io(&self.path, source))?;
            for event in events {
                if cancel.is_cancelled() {
                    return Ok(());
                }
                if matches!(event.kind(), InputEventKind::Key(_)) && event.value() == KEY_DOWN {
                    record_hits(counter, 1)?;
                }
            }
        }
        Ok(())
    }
}
