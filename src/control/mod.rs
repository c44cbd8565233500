//! Brightness control: the decay-driven control loop and its calibratable
//! frequency-to-level curve.

pub mod controller;
pub mod curve;

pub use controller::BrightnessController;
pub use curve::{BrightnessCurve, LinearCurve};
