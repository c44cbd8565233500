//! Daemon subsystem: lifecycle supervision, signal-driven cancellation,
//! privilege drop.

pub mod privileges;
pub mod signals;
pub mod supervisor;
