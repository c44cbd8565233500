//! Lifecycle supervision: Init → Spawning → Running → ShuttingDown →
//! Terminated, with fatal exits from the first two states.

use crossbeam_channel::unbounded;
use tracing::{info, warn};

use crate::activity::SharedCounter;
use crate::actuator::{Backlight, SysfsBacklight};
use crate::control::{BrightnessController, LinearCurve};
use crate::core::config::DaemonConfig;
use crate::core::errors::{GlowdError, Result};
use crate::daemon::privileges::drop_privileges;
use crate::daemon::signals::{CancelToken, SignalListener};
use crate::monitor::{
    ActivityMonitor, FilesystemMonitor, KeyboardMonitor, PointerMonitor, spawn_monitor,
};

/// Supervisor lifecycle states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Allocating the counter and actuator.
    Init,
    /// Opening event sources and starting workers.
    Spawning,
    /// Steady state: the control loop owns this thread.
    Running,
    /// Tearing shared resources down (idempotent).
    ShuttingDown,
    /// Nothing left to do.
    Terminated,
}

fn transition(state: &mut SupervisorState, to: SupervisorState) {
    info!(from = ?*state, to = ?to, "supervisor state change");
    *state = to;
}

/// Open event sources for every enabled monitor variant. A disabled variant
/// gets no monitor at all, so its events can never reach the counter.
pub fn build_monitors(config: &DaemonConfig) -> Result<Vec<Box<dyn ActivityMonitor>>> {
    let mut monitors: Vec<Box<dyn ActivityMonitor>> = Vec::new();
    if config.monitors.keyboard {
        monitors.push(Box::new(KeyboardMonitor::open(&config.devices)?));
    }
    if config.monitors.pointer {
        monitors.push(Box::new(PointerMonitor::open(&config.devices.pointer_device)?));
    }
    if config.monitors.filesystem {
        monitors.push(Box::new(FilesystemMonitor::open(&config.monitors.watch_path())?));
    }
    if monitors.is_empty() {
        info!("no activity monitors enabled; the light will stay dark");
    }
    Ok(monitors)
}

/// Run the daemon to completion: allocate resources, spawn workers, drive
/// the control loop, tear down.
pub fn run(config: &DaemonConfig) -> Result<()> {
    let mut state = SupervisorState::Init;
    info!(state = ?state, "supervisor starting");

    let counter = SharedCounter::create(&config.lock_path())?;
    let actuator = SysfsBacklight::init(&config.actuator.led_dir)?;
    let monitors = build_monitors(config)?;
    // All privileged resources are held; nothing past this point needs root.
    drop_privileges(&config.privileges)?;

    transition(&mut state, SupervisorState::Spawning);
    run_with(
        config,
        &mut state,
        counter,
        Box::new(actuator),
        monitors,
        &CancelToken::new(),
    )
}

/// Supervision core, parameterized over the actuator and monitors so tests
/// can substitute doubles. Expects `state` already at `Spawning`: event
/// sources are open and privileges are already dropped by the caller.
pub fn run_with(
    config: &DaemonConfig,
    state: &mut SupervisorState,
    counter: SharedCounter,
    actuator: Box<dyn Backlight>,
    monitors: Vec<Box<dyn ActivityMonitor>>,
    cancel: &CancelToken,
) -> Result<()> {
    let listener = SignalListener::install(cancel.clone())?;
    let (exit_tx, exit_rx) = unbounded();

    let mut workers = Vec::with_capacity(monitors.len());
    for monitor in monitors {
        match spawn_monitor(monitor, counter.clone(), cancel.clone(), exit_tx.clone()) {
            Ok(handle) => workers.push(handle),
            Err(err) => {
                // Best-effort teardown of whatever already started.
                cancel.cancel();
                listener.shutdown();
                if let Err(destroy_err) = counter.destroy() {
                    warn!(%destroy_err, "counter teardown after spawn failure");
                }
                transition(state, SupervisorState::Terminated);
                return Err(err);
            }
        }
    }
    drop(exit_tx);

    // Any single monitor exit tears the whole daemon down. Deliberate
    // all-or-nothing policy: running with silently reduced signal coverage
    // is worse than restarting.
    let exit_watcher = {
        let cancel = cancel.clone();
        std::thread::Builder::new()
            .name("glowd-exit-watcher".to_string())
            .spawn(move || {
                if let Ok(exit) = exit_rx.recv() {
                    info!(
                        monitor = exit.kind.name(),
                        clean = exit.outcome.is_ok(),
                        "monitor exited, initiating shutdown"
                    );
                    cancel.cancel();
                }
            })
            .map_err(|source| GlowdError::Spawn {
                worker: "exit-watcher",
                details: source.to_string(),
            })?
    };

    transition(state, SupervisorState::Running);
    let mut controller = BrightnessController::new(
        counter.clone(),
        actuator,
        Box::new(LinearCurve::default()),
        config.sampling.clone(),
    );
    let run_result = controller.run(cancel);

    transition(state, SupervisorState::ShuttingDown);
    cancel.cancel();
    listener.shutdown();
    if let Err(err) = counter.destroy() {
        warn!(%err, "counter already destroyed during teardown");
    }
    // A worker still blocked in a device read cannot be joined, and the
    // exit-watcher blocks with it; both are reclaimed when the process
    // exits. Join whatever already finished.
    for worker in workers.into_iter().chain(Some(exit_watcher)) {
        if worker.is_finished() {
            let _ = worker.join();
        }
    }

    transition(state, SupervisorState::Terminated);
    run_result
}
