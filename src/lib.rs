//! glowd — activity-driven keyboard backlight daemon.
//!
//! Monitor workers (keyboard, pointer, filesystem) block on their event
//! sources and feed a shared activity counter; the brightness controller
//! atomically fetches-and-decays the counter once per sampling interval and
//! drives the actuator, so the light fades out exponentially after activity
//! stops. The supervisor owns the lifecycle: exclusive instance creation,
//! worker spawning, signal-driven cancellation, and destroy-exactly-once
//! teardown.

pub mod activity;
pub mod actuator;
pub mod cli_app;
pub mod control;
pub mod core;
pub mod daemon;
pub mod logging;
pub mod monitor;
