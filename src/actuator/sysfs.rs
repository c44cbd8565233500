//! Sysfs LED backlight: writes the `brightness` attribute of a LED class
//! device, clamped to its reported `max_brightness`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::actuator::Backlight;
use crate::core::errors::{GlowdError, Result};

/// Backlight driven through `/sys/class/leds/<name>/brightness`.
pub struct SysfsBacklight {
    brightness_path: PathBuf,
    max_brightness: i32,
}

impl SysfsBacklight {
    /// Open the LED directory and read its brightness range.
    pub fn init(led_dir: &Path) -> Result<Self> {
        let max_path = led_dir.join("max_brightness");
        let raw = std::fs::read_to_string(&max_path)
            .map_err(|source| GlowdError::io(&max_path, source))?;
        let max_brightness =
            raw.trim()
                .parse::<i32>()
                .map_err(|parse_err| GlowdError::Actuator {
                    path: max_path.clone(),
                    details: format!("unparseable max_brightness {raw:?}: {parse_err}"),
                })?;
        if max_brightness <= 0 {
            return Err(GlowdError::Actuator {
                path: max_path,
                details: format!("max_brightness must be positive, got {max_brightness}"),
            });
        }
        let backlight = Self {
            brightness_path: led_dir.join("brightness"),
            max_brightness,
        };
        // Fail at init, not mid-loop, when the attribute is unwritable.
        std::fs::write(&backlight.brightness_path, b"0")
            .map_err(|source| GlowdError::io(&backlight.brightness_path, source))?;
        debug!(led = %led_dir.display(), max_brightness, "actuator initialized");
        Ok(backlight)
    }

    /// Upper end of the device's brightness range.
    #[must_use]
    pub const fn max_brightness(&self) -> i32 {
        self.max_brightness
    }
}

impl Backlight for SysfsBacklight {
    fn set_brightness(&mut self, level: i32) -> Result<()> {
        let clamped = level.clamp(0, self.max_brightness);
        std::fs::write(&self.brightness_path, clamped.to_string())
            .map_err(|source| GlowdError::io(&self.brightness_path, source))
    }

    fn shutdown(&mut self) -> Result<()> {
        self.set_brightness(0)
    }
}
