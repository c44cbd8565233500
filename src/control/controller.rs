//! Brightness control loop: once per interval, atomically fetch-and-decay
//! the activity counter, map the raw count to a level, and drive the
//! actuator.

use tracing::{debug, info, trace};

use crate::activity::SharedCounter;
use crate::actuator::Backlight;
use crate::control::curve::BrightnessCurve;
use crate::core::config::SamplingConfig;
use crate::core::errors::Result;
use crate::daemon::signals::CancelToken;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// The long-lived control loop. Owns the actuator for the daemon's life and
/// powers it down on the way out.
pub struct BrightnessController {
    counter: SharedCounter,
    actuator: Box<dyn Backlight>,
    curve: Box<dyn BrightnessCurve>,
    sampling: SamplingConfig,
}

impl BrightnessController {
    /// Assemble a controller over the shared counter and actuator.
    #[must_use]
    pub fn new(
        counter: SharedCounter,
        actuator: Box<dyn Backlight>,
        curve: Box<dyn BrightnessCurve>,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            counter,
            actuator,
            curve,
            sampling,
        }
    }

    /// Run cycles until cancellation, then force the light off and release
    /// the actuator. The interval sleep is cancellation-aware, so a shutdown
    /// signal ends the loop within one wakeup.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<()> {
        let run_result = self.run_cycles(cancel);
        // The light goes dark on every exit path, whatever the counter
        // holds at shutdown time.
        let off_result = self
            .actuator
            .set_brightness(0)
            .and_then(|()| self.actuator.shutdown());
        info!("controller stopped, actuator released");
        run_result.and(off_result)
    }

    fn run_cycles(&mut self, cancel: &CancelToken) -> Result<()> {
        let decay_factor = self.sampling.decay_factor;
        let interval = self.sampling.interval();
        while !cancel.is_cancelled() {
            match self.counter.read_and_transform(|value| value / decay_factor) {
                Ok(raw) => {
                    let frequency =
                        f64::from(raw) / (self.sampling.interval_us as f64) * MICROS_PER_SEC;
                    let level = self.curve.level_for(frequency);
                    trace!(raw, frequency, level, "control cycle");
                    self.actuator.set_brightness(level)?;
                }
                Err(err) if err.is_skippable() => {
                    debug!(%err, "skipping control cycle");
                }
                Err(err) => return Err(err),
            }
            if cancel.sleep(interval) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BrightnessController;
    use crate::activity::SharedCounter;
    use crate::actuator::Backlight;
    use crate::control::curve::LinearCurve;
    use crate::core::config::SamplingConfig;
    use crate::core::errors::Result;
    use crate::daemon::signals::CancelToken;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingBacklight {
        levels: Arc<Mutex<Vec<i32>>>,
        shutdowns: Arc<Mutex<u32>>,
    }

    impl Backlight for RecordingBacklight {
        fn set_brightness(&mut self, level: i32) -> Result<()> {
            self.levels.lock().push(level);
            Ok(())
        }

        fn shutdown(&mut self) -> Result<()> {
            *self.shutdowns.lock() += 1;
            Ok(())
        }
    }

    fn counter() -> (tempfile::TempDir, SharedCounter) {
        let dir = tempfile::tempdir().expect("tempdir");
        let counter =
            SharedCounter::create(&dir.path().join("glowd.lock")).expect("create counter");
        (dir, counter)
    }

    fn controller(
        counter: SharedCounter,
        backlight: &RecordingBacklight,
        sampling: SamplingConfig,
    ) -> BrightnessController {
        BrightnessController::new(
            counter,
            Box::new(backlight.clone()),
            Box::new(LinearCurve::default()),
            sampling,
        )
    }

    #[test]
    fn one_keydown_at_default_resolution_yields_level_two() {
        let (_guard, counter) = counter();
        counter.increment(1).expect("increment");
        let backlight = RecordingBacklight::default();
        let mut controller = controller(counter.clone(), &backlight, SamplingConfig::default());

        let cancel = CancelToken::new();
        let loop_thread = {
            let cancel = cancel.clone();
            std::thread::spawn(move || controller.run(&cancel))
        };
        // First cycle runs immediately; cancel during the interval sleep.
        std::thread::sleep(Duration::from_millis(100));
        cancel.cancel();
        loop_thread
            .join()
            .expect("controller join")
            .expect("controller run");

        let levels = backlight.levels.lock();
        // raw=1 over 500000 µs → 2.0 events/s → level 2 under the default
        // curve, then the forced 0 on shutdown.
        assert_eq!(levels.first().copied(), Some(2));
        assert_eq!(levels.last().copied(), Some(0));
        assert_eq!(counter.read().expect("read"), 0);
        assert_eq!(*backlight.shutdowns.lock(), 1);
    }

    #[test]
    fn shutdown_forces_level_zero_regardless_of_counter_value() {
        let (_guard, counter) = counter();
        counter.increment(1_000).expect("increment");
        let backlight = RecordingBacklight::default();
        let mut controller = controller(counter, &backlight, SamplingConfig::default());

        let cancel = CancelToken::new();
        cancel.cancel();
        controller.run(&cancel).expect("controller run");

        let levels = backlight.levels.lock();
        assert_eq!(levels.as_slice(), &[0]);
        assert_eq!(*backlight.shutdowns.lock(), 1);
    }

    #[test]
    fn destroyed_counter_skips_cycles_and_still_exits_cleanly() {
        let (_guard, counter) = counter();
        counter.destroy().expect("destroy");
        let backlight = RecordingBacklight::default();
        let sampling = SamplingConfig {
            interval_us: 1_000,
            decay_factor: 2,
        };
        let mut controller = controller(counter, &backlight, sampling);

        let cancel = CancelToken::new();
        let loop_thread = {
            let cancel = cancel.clone();
            std::thread::spawn(move || controller.run(&cancel))
        };
        std::thread::sleep(Duration::from_millis(30));
        cancel.cancel();
        loop_thread
            .join()
            .expect("controller join")
            .expect("controller run");

        // Every live cycle was skipped; only the shutdown write landed.
        assert_eq!(backlight.levels.lock().as_slice(), &[0]);
    }

    #[test]
    fn cycles_with_no_new_activity_decay_the_counter_to_zero() {
        let (_guard, counter) = counter();
        counter.increment(64).expect("increment");
        let backlight = RecordingBacklight::default();
        let sampling = SamplingConfig {
            interval_us: 1_000,
            decay_factor: 2,
        };
        let mut controller = controller(counter.clone(), &backlight, sampling);

        let cancel = CancelToken::new();
        let loop_thread = {
            let cancel = cancel.clone();
            std::thread::spawn(move || controller.run(&cancel))
        };
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while counter.read().expect("read") > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        cancel.cancel();
        loop_thread
            .join()
            .expect("controller join")
            .expect("controller run");
        assert_eq!(counter.read().expect("read"), 0);
    }
}
