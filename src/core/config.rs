//! Daemon configuration: TOML file with defaults matching the shipped daemon,
//! CLI overrides applied on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::errors::{GlowdError, Result};

/// Sampling and decay parameters for the control loop.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Interval between control cycles, in microseconds. Also the
    /// normalizing denominator when converting a raw hit count into an
    /// events-per-second frequency.
    pub interval_us: u64,
    /// Integer divisor applied to the counter once per cycle.
    pub decay_factor: i32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_us: 500_000,
            decay_factor: 2,
        }
    }
}

impl SamplingConfig {
    /// Control-cycle interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_us)
    }
}

/// Which activity classes feed the counter.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Count key-down events from the classified keyboard device.
    pub keyboard: bool,
    /// Count packets from the pointer device node.
    pub pointer: bool,
    /// Count filesystem notifications under `watch_path`.
    pub filesystem: bool,
    /// Root of the recursive filesystem watch.
    pub watch_path: Option<PathBuf>,
}

impl MonitorConfig {
    /// Effective watch root (defaults to the filesystem root).
    #[must_use]
    pub fn watch_path(&self) -> PathBuf {
        self.watch_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    /// True when no activity class is enabled. The daemon still runs its
    /// control loop in that case, permanently dimming.
    #[must_use]
    pub const fn all_disabled(&self) -> bool {
        !self.keyboard && !self.pointer && !self.filesystem
    }
}

/// Device node locations and probe bounds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Directory holding `eventN` input device nodes.
    pub input_dir: PathBuf,
    /// Highest `eventN` index the keyboard probe will try before giving up.
    pub max_probe_index: u32,
    /// Pointer device node read in raw packet mode.
    pub pointer_device: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/dev/input"),
            max_probe_index: 256,
            pointer_device: PathBuf::from("/dev/input/mice"),
        }
    }
}

/// Actuator sysfs location.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Sysfs LED directory containing `brightness` and `max_brightness`.
    pub led_dir: PathBuf,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            led_dir: PathBuf::from("/sys/class/leds/tpacpi::thinklight"),
        }
    }
}

/// Identity the daemon drops to after acquiring privileged resources.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PrivilegeConfig {
    /// Unprivileged user id (default: nobody).
    pub uid: u32,
    /// Unprivileged group id (default: nobody).
    pub gid: u32,
}

impl Default for PrivilegeConfig {
    fn default() -> Self {
        Self {
            uid: 65534,
            gid: 65534,
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Sampling and decay parameters.
    pub sampling: SamplingConfig,
    /// Enabled activity classes.
    pub monitors: MonitorConfig,
    /// Device node locations.
    pub devices: DeviceConfig,
    /// Actuator location.
    pub actuator: ActuatorConfig,
    /// Identity to drop to.
    pub privileges: PrivilegeConfig,
    /// Instance lock path guarding against double-start.
    pub lock_path: Option<PathBuf>,
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GlowdError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| GlowdError::io(path, source))?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective instance-lock path.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.lock_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("/run/glowd.lock"))
    }

    /// Reject configurations the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.interval_us == 0 {
            return Err(GlowdError::InvalidConfig {
                details: "sampling.interval_us must be greater than zero".to_string(),
            });
        }
        if self.sampling.decay_factor < 2 {
            return Err(GlowdError::InvalidConfig {
                details: format!(
                    "sampling.decay_factor must be at least 2, got {}",
                    self.sampling.decay_factor
                ),
            });
        }
        Ok(())
    }
}
