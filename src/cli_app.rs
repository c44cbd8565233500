//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::Parser;

use crate::core::config::DaemonConfig;
use crate::core::errors::Result;
use crate::daemon::supervisor;

/// glowd — activity-driven keyboard backlight daemon.
///
/// With no monitor flags the control loop still runs; the counter never
/// increments and the light stays dark.
#[derive(Debug, Parser)]
#[command(name = "glowd", version, about)]
pub struct Cli {
    /// Count keystrokes from the classified keyboard device.
    #[arg(short = 'k', long)]
    pub keyboard: bool,

    /// Count pointer movement and button packets.
    #[arg(short = 'm', long)]
    pub pointer: bool,

    /// Count filesystem notifications under the watch root.
    #[arg(short = 'f', long)]
    pub filesystem: bool,

    /// Root of the recursive filesystem watch (implies --filesystem).
    #[arg(long, value_name = "PATH")]
    pub watch_path: Option<PathBuf>,

    /// Configuration file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the configuration file (or defaults) and overlay the monitor
    /// flags on top.
    pub fn effective_config(&self) -> Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::load(path)?,
            None => DaemonConfig::default(),
        };
        if self.keyboard {
            config.monitors.keyboard = true;
        }
        if self.pointer {
            config.monitors.pointer = true;
        }
        if self.filesystem || self.watch_path.is_some() {
            config.monitors.filesystem = true;
        }
        if let Some(path) = &self.watch_path {
            config.monitors.watch_path = Some(path.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Resolve configuration and run the daemon to completion.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.effective_config()?;
    supervisor::run(&config)
}
