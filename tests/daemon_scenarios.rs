//! End-to-end daemon scenarios: activity-to-brightness flow, double-start
//! refusal, disabled monitors, and shutdown behavior.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use glowd::activity::SharedCounter;
use glowd::actuator::Backlight;
use glowd::control::{BrightnessController, LinearCurve};
use glowd::core::config::{DaemonConfig, SamplingConfig};
use glowd::core::errors::{GlowdError, Result};
use glowd::daemon::signals::CancelToken;
use glowd::daemon::supervisor::{self, SupervisorState};
use glowd::monitor::{ActivityMonitor, MonitorKind};

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

/// Stands in for a keyboard monitor delivering one key-down event.
struct OneKeydownMonitor;

impl ActivityMonitor for OneKeydownMonitor {
    fn kind(&self) -> MonitorKind {
        MonitorKind::Keyboard
    }

    fn run(self: Box<Self>, counter: &SharedCounter, cancel: &CancelToken) -> Result<()> {
        counter.increment(1)?;
        // Hold the loop open like a monitor blocked in a read would, so the
        // controller gets its cycle in before this worker's exit cascades.
        cancel.sleep(Duration::from_secs(30));
        Ok(())
    }
}

fn counter_in(dir: &tempfile::TempDir) -> SharedCounter {
    SharedCounter::create(&dir.path().join("glowd.lock")).expect("create counter")
}

#[test]
fn one_keydown_lights_the_backlight_at_level_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = counter_in(&dir);
    counter.increment(1).expect("key-down");

    let backlight = RecordingBacklight::default();
    let mut controller = BrightnessController::new(
        counter.clone(),
        Box::new(backlight.clone()),
        Box::new(LinearCurve::default()),
        SamplingConfig::default(),
    );

    let cancel = CancelToken::new();
    let loop_thread = {
        let cancel = cancel.clone();
        std::thread::spawn(move || controller.run(&cancel))
    };
    std::thread::sleep(Duration::from_millis(100));
    cancel.cancel();
    loop_thread
        .join()
        .expect("controller join")
        .expect("controller run");

    // raw=1 over the 500000 µs interval → 2.0 events/s → level 2; the
    // decayed counter holds 0.
    assert_eq!(backlight.levels.lock().first().copied(), Some(2));
    assert_eq!(counter.read().expect("read"), 0);
}

#[test]
fn full_supervised_run_delivers_activity_and_dims_on_shutdown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = counter_in(&dir);
    let backlight = RecordingBacklight::default();
    let mut config = DaemonConfig::default();
    config.sampling.interval_us = 2_000;
    let mut state = SupervisorState::Spawning;
    let cancel = CancelToken::new();

    let canceller = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        })
    };
    supervisor::run_with(
        &config,
        &mut state,
        counter,
        Box::new(backlight.clone()),
        vec![Box::new(OneKeydownMonitor)],
        &cancel,
    )
    .expect("supervised run");
    canceller.join().expect("canceller join");

    assert_eq!(state, SupervisorState::Terminated);
    let levels = backlight.levels.lock();
    assert!(
        levels.iter().any(|&level| level > 0),
        "the key-down must have lit the backlight: {levels:?}"
    );
    assert_eq!(levels.last().copied(), Some(0));
    assert_eq!(*backlight.shutdowns.lock(), 1);
}

#[test]
fn second_daemon_instance_is_refused_before_anything_spawns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_path = dir.path().join("glowd.lock");
    let holder = SharedCounter::create(&lock_path).expect("first instance");

    let mut config = DaemonConfig::default();
    config.lock_path = Some(lock_path);
    // If the supervisor got past counter creation it would hit the actuator
    // and fail with an IO error instead.
    config.actuator.led_dir = dir.path().join("no-such-led");

    let result = supervisor::run(&config);
    assert!(matches!(result, Err(GlowdError::AlreadyRunning { .. })));
    drop(holder);
}

#[test]
fn disabled_monitor_variants_produce_no_monitors_at_all() {
    let config = DaemonConfig::default();
    let monitors = supervisor::build_monitors(&config).expect("build");
    assert!(monitors.is_empty());
}

#[test]
fn daemon_without_monitors_keeps_the_counter_at_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = counter_in(&dir);
    let observer = counter.clone();
    let backlight = RecordingBacklight::default();
    let mut config = DaemonConfig::default();
    config.sampling.interval_us = 1_000;
    let mut state = SupervisorState::Spawning;
    let cancel = CancelToken::new();

    let canceller = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            cancel.cancel();
        })
    };
    supervisor::run_with(
        &config,
        &mut state,
        counter,
        Box::new(backlight.clone()),
        Vec::new(),
        &cancel,
    )
    .expect("supervised run");
    canceller.join().expect("canceller join");

    // The counter was torn down by the supervisor; every level it drove
    // while live was the dim level.
    assert!(matches!(
        observer.read(),
        Err(GlowdError::CounterDestroyed)
    ));
    assert!(backlight.levels.lock().iter().all(|&level| level == 0));
}

#[test]
fn shutdown_dims_even_with_a_loaded_counter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = counter_in(&dir);
    counter.increment(10_000).expect("load counter");
    let backlight = RecordingBacklight::default();
    let mut controller = BrightnessController::new(
        counter,
        Box::new(backlight.clone()),
        Box::new(LinearCurve::default()),
        SamplingConfig::default(),
    );

    let cancel = CancelToken::new();
    cancel.cancel();
    controller.run(&cancel).expect("controller run");

    assert_eq!(backlight.levels.lock().as_slice(), &[0]);
    assert_eq!(*backlight.shutdowns.lock(), 1);
}
